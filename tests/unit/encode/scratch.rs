use super::*;

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pipzoom_scratch_{tag}_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn scratch_name_sits_beside_target() {
    let s = ScratchFile::beside(Path::new("/tmp/out/final.mp4"));
    assert_eq!(s.path(), Some(Path::new("/tmp/out/final.partial.mp4")));
    let s = ScratchFile::beside(Path::new("clip"));
    assert_eq!(s.path(), Some(Path::new("clip.partial")));
}

#[test]
fn dropped_scratch_is_deleted() {
    let dir = temp_dir("drop");
    let path = dir.join("a.partial.mp4");
    std::fs::write(&path, b"x").unwrap();
    drop(ScratchFile::new(&path));
    assert!(!path.exists());
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn persisted_scratch_replaces_target() {
    let dir = temp_dir("persist");
    let target = dir.join("a.mp4");
    std::fs::write(&target, b"old").unwrap();
    let scratch = ScratchFile::beside(&target);
    std::fs::write(scratch.path().unwrap(), b"new").unwrap();
    scratch.persist(&target).unwrap();
    assert_eq!(std::fs::read(&target).unwrap(), b"new");
    assert!(!dir.join("a.partial.mp4").exists());
    std::fs::remove_dir_all(&dir).unwrap();
}
