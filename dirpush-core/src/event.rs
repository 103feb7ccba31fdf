use notify::{
    event::{AccessKind, AccessMode, CreateKind, ModifyKind, RemoveKind, RenameMode},
    EventKind,
};
use std::path::PathBuf;

/// What happened to a path, as far as the reconciler cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    WrittenAndClosed,
    Deleted,
    MovedOut,
    MovedIn,
}

/// One filesystem notification, normalized from the watcher backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub is_dir: bool,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(path: impl Into<PathBuf>, is_dir: bool, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            is_dir,
            kind,
        }
    }
}

/// Convert a notify::Event into zero or more ChangeEvent.
///
/// Move-outs carry `is_dir = false` since the entry is no longer there to
/// stat; the removal fallback in the session compensates.
pub fn translate(event: notify::Event) -> Vec<ChangeEvent> {
    let mut out = Vec::new();
    match event.kind {
        EventKind::Create(kind) => {
            for p in event.paths {
                let is_dir = match kind {
                    CreateKind::Folder => true,
                    CreateKind::File => false,
                    _ => p.is_dir(),
                };
                out.push(ChangeEvent::new(p, is_dir, ChangeKind::Created));
            }
        }
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => {
            for p in event.paths {
                out.push(ChangeEvent::new(p, false, ChangeKind::WrittenAndClosed));
            }
        }
        // Backends without a close-write notion report plain data writes.
        #[cfg(not(target_os = "linux"))]
        EventKind::Modify(ModifyKind::Data(_)) => {
            for p in event.paths {
                out.push(ChangeEvent::new(p, false, ChangeKind::WrittenAndClosed));
            }
        }
        EventKind::Remove(kind) => {
            for p in event.paths {
                let is_dir = matches!(kind, RemoveKind::Folder);
                out.push(ChangeEvent::new(p, is_dir, ChangeKind::Deleted));
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            for p in event.paths {
                out.push(ChangeEvent::new(p, false, ChangeKind::MovedOut));
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            for p in event.paths {
                let is_dir = p.is_dir();
                out.push(ChangeEvent::new(p, is_dir, ChangeKind::MovedIn));
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            // rename event contains two paths (from, to)
            if event.paths.len() == 2 {
                let [from, to]: [PathBuf; 2] =
                    event.paths.try_into().expect("expected exactly 2 paths");
                out.push(ChangeEvent::new(from, false, ChangeKind::MovedOut));
                let is_dir = to.is_dir();
                out.push(ChangeEvent::new(to, is_dir, ChangeKind::MovedIn));
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Any)) => {
            for p in event.paths {
                if p.exists() {
                    let is_dir = p.is_dir();
                    out.push(ChangeEvent::new(p, is_dir, ChangeKind::MovedIn));
                } else {
                    out.push(ChangeEvent::new(p, false, ChangeKind::MovedOut));
                }
            }
        }
        _ => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::Event;

    #[test]
    fn folder_create_maps_to_created_dir() {
        let ev = Event::new(EventKind::Create(CreateKind::Folder)).add_path("/data/sub".into());
        let out = translate(ev);
        assert_eq!(
            out,
            vec![ChangeEvent::new("/data/sub", true, ChangeKind::Created)]
        );
    }

    #[test]
    fn close_write_maps_to_written() {
        let ev = Event::new(EventKind::Access(AccessKind::Close(AccessMode::Write)))
            .add_path("/data/a.txt".into());
        let out = translate(ev);
        assert_eq!(
            out,
            vec![ChangeEvent::new(
                "/data/a.txt",
                false,
                ChangeKind::WrittenAndClosed
            )]
        );
    }

    #[test]
    fn folder_remove_keeps_dir_flag() {
        let ev = Event::new(EventKind::Remove(RemoveKind::Folder)).add_path("/data/sub".into());
        let out = translate(ev);
        assert_eq!(
            out,
            vec![ChangeEvent::new("/data/sub", true, ChangeKind::Deleted)]
        );
    }

    #[test]
    fn two_path_rename_splits_into_out_and_in() {
        let ev = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path("/data/old".into())
            .add_path("/data/new".into());
        let out = translate(ev);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].kind, ChangeKind::MovedOut);
        assert_eq!(out[0].path, PathBuf::from("/data/old"));
        assert_eq!(out[1].kind, ChangeKind::MovedIn);
        assert_eq!(out[1].path, PathBuf::from("/data/new"));
    }

    #[test]
    fn unrelated_kinds_produce_nothing() {
        let ev = Event::new(EventKind::Access(AccessKind::Open(AccessMode::Read)))
            .add_path("/data/a.txt".into());
        assert!(translate(ev).is_empty());
    }
}
