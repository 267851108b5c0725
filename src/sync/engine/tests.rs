#![cfg(test)]
use crate::model::{ClientDraft, Document};
use crate::sync::engine::{
    PullPurpose, RemoteSnapshot, SyncCommand, SyncConfig, SyncEngine, SyncEvent, SyncNotice,
    SyncStatus,
};
use crate::sync::fingerprint::Fingerprint;

// =========================================================================
// Helpers
// =========================================================================

fn doc_with(names: &[&str]) -> Document {
    let mut doc = Document::default();
    for name in names {
        doc.add_client(
            ClientDraft {
                company_name: name.to_string(),
                ..ClientDraft::default()
            },
            None,
        )
        .unwrap();
    }
    doc
}

fn fp(doc: &Document) -> Fingerprint {
    Fingerprint::of(doc).unwrap()
}

fn started_engine(remote: bool) -> SyncEngine {
    let mut engine = SyncEngine::new(SyncConfig::default());
    engine.handle_event(SyncEvent::Started {
        remote_configured: remote,
    });
    if remote {
        // Empty remote on load.
        engine.handle_event(SyncEvent::PullFinished {
            purpose: PullPurpose::Load,
            result: Ok(None),
        });
    }
    engine
}

fn armed_generation(cmds: &[SyncCommand]) -> Option<u64> {
    cmds.iter().find_map(|c| match c {
        SyncCommand::ArmQuietTimer { generation, .. } => Some(*generation),
        _ => None,
    })
}

fn pushes(cmds: &[SyncCommand]) -> Vec<(Fingerprint, bool)> {
    cmds.iter()
        .filter_map(|c| match c {
            SyncCommand::PushRemote {
                fingerprint,
                forced,
            } => Some((*fingerprint, *forced)),
            _ => None,
        })
        .collect()
}

fn notices(cmds: &[SyncCommand]) -> Vec<SyncNotice> {
    cmds.iter()
        .filter_map(|c| match c {
            SyncCommand::Report(n) => Some(n.clone()),
            _ => None,
        })
        .collect()
}

// =========================================================================
// Tests
// =========================================================================

#[test]
fn start_without_remote_issues_nothing() {
    let mut engine = SyncEngine::new(SyncConfig::default());
    let cmds = engine.handle_event(SyncEvent::Started {
        remote_configured: false,
    });
    assert!(cmds.is_empty());
    assert_eq!(engine.status(), SyncStatus::Idle);
}

#[test]
fn start_with_remote_pulls_for_load() {
    let mut engine = SyncEngine::new(SyncConfig::default());
    let cmds = engine.handle_event(SyncEvent::Started {
        remote_configured: true,
    });

    assert!(cmds
        .iter()
        .any(|c| matches!(c, SyncCommand::PullRemote(PullPurpose::Load))));
    assert_eq!(engine.status(), SyncStatus::Syncing);
}

#[test]
fn remote_document_replaces_local_on_load() {
    let mut engine = SyncEngine::new(SyncConfig::default());
    engine.handle_event(SyncEvent::Started {
        remote_configured: true,
    });

    let remote = doc_with(&["Remote"]);
    let cmds = engine.handle_event(SyncEvent::PullFinished {
        purpose: PullPurpose::Load,
        result: Ok(Some(RemoteSnapshot {
            fingerprint: fp(&remote),
            document: remote.clone(),
        })),
    });

    assert!(cmds
        .iter()
        .any(|c| matches!(c, SyncCommand::ReplaceDocument(d) if *d == remote)));
    assert_eq!(notices(&cmds), vec![SyncNotice::Loaded { replaced: true }]);
    assert_eq!(engine.status(), SyncStatus::Success);

    // Pulled content counts as already pushed.
    let cmds = engine.handle_event(SyncEvent::Mutated {
        fingerprint: fp(&remote),
    });
    assert!(armed_generation(&cmds).is_none());
}

#[test]
fn load_error_keeps_local_and_enters_error() {
    let mut engine = SyncEngine::new(SyncConfig::default());
    engine.handle_event(SyncEvent::Started {
        remote_configured: true,
    });
    let cmds = engine.handle_event(SyncEvent::PullFinished {
        purpose: PullPurpose::Load,
        result: Err("offline".to_string()),
    });

    assert!(!cmds
        .iter()
        .any(|c| matches!(c, SyncCommand::ReplaceDocument(_))));
    assert_eq!(engine.status(), SyncStatus::Error);
}

#[test]
fn mutation_without_remote_schedules_nothing() {
    let mut engine = started_engine(false);
    let cmds = engine.handle_event(SyncEvent::Mutated {
        fingerprint: fp(&doc_with(&["A"])),
    });
    assert!(cmds.is_empty());
}

#[test]
fn burst_of_mutations_pushes_once_with_final_state() {
    let mut engine = started_engine(true);

    let mut last_generation = 0;
    let mut final_fp = None;
    let mut names = Vec::new();
    for name in ["A", "B", "C", "D"] {
        names.push(name);
        let fingerprint = fp(&doc_with(&names));
        let cmds = engine.handle_event(SyncEvent::Mutated { fingerprint });
        last_generation = armed_generation(&cmds).expect("every mutation re-arms");
        final_fp = Some(fingerprint);
    }

    // Earlier timers fire late: all stale.
    for generation in 1..last_generation {
        let cmds = engine.handle_event(SyncEvent::QuietPeriodElapsed { generation });
        assert!(pushes(&cmds).is_empty(), "stale fire must not push");
    }

    let cmds = engine.handle_event(SyncEvent::QuietPeriodElapsed {
        generation: last_generation,
    });
    assert_eq!(pushes(&cmds), vec![(final_fp.unwrap(), false)]);
}

#[test]
fn unchanged_document_is_not_pushed_twice() {
    let mut engine = started_engine(true);
    let doc = doc_with(&["A"]);

    let cmds = engine.handle_event(SyncEvent::Mutated {
        fingerprint: fp(&doc),
    });
    let generation = armed_generation(&cmds).unwrap();
    engine.handle_event(SyncEvent::QuietPeriodElapsed { generation });
    engine.handle_event(SyncEvent::PushFinished {
        fingerprint: fp(&doc),
        result: Ok(()),
    });

    let cmds = engine.handle_event(SyncEvent::Mutated {
        fingerprint: fp(&doc),
    });
    assert!(armed_generation(&cmds).is_none());
    assert!(!engine.has_pending_push());
}

#[test]
fn reverting_to_pushed_state_cancels_pending_push() {
    let mut engine = started_engine(true);
    let a = doc_with(&["A"]);
    let b = doc_with(&["A", "B"]);

    let generation = armed_generation(&engine.handle_event(SyncEvent::Mutated {
        fingerprint: fp(&a),
    }))
    .unwrap();
    engine.handle_event(SyncEvent::QuietPeriodElapsed { generation });
    engine.handle_event(SyncEvent::PushFinished {
        fingerprint: fp(&a),
        result: Ok(()),
    });

    engine.handle_event(SyncEvent::Mutated {
        fingerprint: fp(&b),
    });
    assert!(engine.has_pending_push());

    let cmds = engine.handle_event(SyncEvent::Mutated {
        fingerprint: fp(&a),
    });
    assert!(cmds
        .iter()
        .any(|c| matches!(c, SyncCommand::CancelQuietTimer)));
    assert!(!engine.has_pending_push());
}

#[test]
fn failed_push_is_not_retried_until_next_mutation() {
    let mut engine = started_engine(true);
    let doc = doc_with(&["A"]);

    let generation = armed_generation(&engine.handle_event(SyncEvent::Mutated {
        fingerprint: fp(&doc),
    }))
    .unwrap();
    engine.handle_event(SyncEvent::QuietPeriodElapsed { generation });
    let cmds = engine.handle_event(SyncEvent::PushFinished {
        fingerprint: fp(&doc),
        result: Err("503".to_string()),
    });

    assert_eq!(engine.status(), SyncStatus::Error);
    assert!(pushes(&cmds).is_empty());
    assert_eq!(notices(&cmds), vec![SyncNotice::PushFailed("503".to_string())]);

    // Same content again: fingerprint was not recorded, so it re-arms.
    let cmds = engine.handle_event(SyncEvent::Mutated {
        fingerprint: fp(&doc),
    });
    assert!(armed_generation(&cmds).is_some());
}

#[test]
fn force_push_bypasses_guard_and_debounce() {
    let mut engine = started_engine(true);
    let doc = doc_with(&["A"]);

    engine.handle_event(SyncEvent::PushFinished {
        fingerprint: fp(&doc),
        result: Ok(()),
    });
    engine.handle_event(SyncEvent::Mutated {
        fingerprint: fp(&doc_with(&["A", "B"])),
    });

    let cmds = engine.handle_event(SyncEvent::ForcePush {
        fingerprint: fp(&doc),
    });
    assert_eq!(pushes(&cmds), vec![(fp(&doc), true)]);
    assert!(cmds
        .iter()
        .any(|c| matches!(c, SyncCommand::CancelQuietTimer)));
    assert!(!engine.has_pending_push());
}

#[test]
fn force_actions_without_remote_report_it() {
    let mut engine = started_engine(false);
    let cmds = engine.handle_event(SyncEvent::ForcePush {
        fingerprint: fp(&Document::default()),
    });
    assert_eq!(notices(&cmds), vec![SyncNotice::RemoteNotConfigured]);

    let cmds = engine.handle_event(SyncEvent::ForcePull { confirmed: true });
    assert_eq!(notices(&cmds), vec![SyncNotice::RemoteNotConfigured]);
}

#[test]
fn declined_force_pull_does_nothing() {
    let mut engine = started_engine(true);
    let cmds = engine.handle_event(SyncEvent::ForcePull { confirmed: false });
    assert_eq!(notices(&cmds), vec![SyncNotice::Declined]);
    assert_eq!(cmds.len(), 1);
}

#[test]
fn restore_from_empty_remote_reports_nothing_to_restore() {
    let mut engine = started_engine(true);
    engine.handle_event(SyncEvent::ForcePull { confirmed: true });

    for result in [
        Ok(None),
        Ok(Some(RemoteSnapshot {
            fingerprint: fp(&Document::default()),
            document: Document::default(),
        })),
    ] {
        let cmds = engine.handle_event(SyncEvent::PullFinished {
            purpose: PullPurpose::Restore,
            result,
        });
        assert!(!cmds
            .iter()
            .any(|c| matches!(c, SyncCommand::ReplaceDocument(_))));
        assert_eq!(notices(&cmds), vec![SyncNotice::NothingToRestore]);
    }
}

#[test]
fn remote_attached_late_loads_exactly_once() {
    let mut engine = started_engine(false);

    let cmds = engine.handle_event(SyncEvent::RemoteAttached);
    assert!(cmds
        .iter()
        .any(|c| matches!(c, SyncCommand::PullRemote(PullPurpose::Load))));

    let cmds = engine.handle_event(SyncEvent::RemoteAttached);
    assert!(cmds.is_empty(), "second availability signal must not reload");
}

#[test]
fn status_reverts_to_idle_after_window() {
    let mut engine = started_engine(true);
    let cmds = engine.handle_event(SyncEvent::PushFinished {
        fingerprint: fp(&Document::default()),
        result: Ok(()),
    });
    let generation = cmds
        .iter()
        .find_map(|c| match c {
            SyncCommand::ArmStatusTimer { generation, .. } => Some(*generation),
            _ => None,
        })
        .unwrap();

    engine.handle_event(SyncEvent::StatusWindowElapsed { generation });
    assert_eq!(engine.status(), SyncStatus::Idle);
}

#[test]
fn disposed_engine_ignores_everything() {
    let mut engine = started_engine(true);
    engine.handle_event(SyncEvent::Mutated {
        fingerprint: fp(&doc_with(&["A"])),
    });

    let cmds = engine.handle_event(SyncEvent::Disposed);
    assert!(cmds
        .iter()
        .any(|c| matches!(c, SyncCommand::CancelQuietTimer)));
    assert!(engine.is_disposed());

    let cmds = engine.handle_event(SyncEvent::QuietPeriodElapsed { generation: 1 });
    assert!(cmds.is_empty());
}

#[test]
fn local_wipe_drops_pending_push() {
    let mut engine = started_engine(true);
    engine.handle_event(SyncEvent::Mutated {
        fingerprint: fp(&doc_with(&["A"])),
    });
    assert!(engine.has_pending_push());

    let cmds = engine.handle_event(SyncEvent::LocalWiped);
    assert!(cmds
        .iter()
        .any(|c| matches!(c, SyncCommand::CancelQuietTimer)));
    assert!(!engine.has_pending_push());
}
