//! End-to-end copy command integration tests.
//!
//! Mirror runs, date-bucketed runs, collision reports, dry runs and the two
//! failure policies, all driven through `commands::sync::run`.

use chrono::{Local, TimeZone};
use copydiff::commands::sync::run;
use copydiff::config::{FailurePolicy, SyncMode};
use copydiff::diff::MonthLocale;
use copydiff::report::REPORT_FILE_NAME;
use copydiff::{Config, SyncError};
use filetime::FileTime;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn config_for(source: &Path, destination: &Path) -> Config {
    Config {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        ..Config::default()
    }
}

fn date_config_for(source: &Path, destination: &Path) -> Config {
    Config {
        mode: SyncMode::ByDate,
        ..config_for(source, destination)
    }
}

/// Set a file's mtime to noon local time on the given day
fn set_local_mtime(path: &Path, year: i32, month: u32, day: u32) {
    let when = Local
        .with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .expect("unambiguous local time");
    filetime::set_file_mtime(path, FileTime::from_unix_time(when.timestamp(), 0))
        .expect("set mtime");
}

#[test]
fn test_mirror_copies_only_missing_files() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");

    fs::create_dir_all(src.path().join("sub")).expect("create source sub dir");
    fs::write(src.path().join("a.txt"), b"source-a").expect("write source a");
    fs::write(src.path().join("sub/b.txt"), b"source-b").expect("write source b");
    fs::write(dst.path().join("a.txt"), b"dest-a").expect("write destination a");

    let outcome = run(config_for(src.path(), dst.path())).expect("mirror run should succeed");

    assert_eq!(outcome.copied, 1);
    assert_eq!(outcome.skipped, 1);
    assert!(outcome.collisions.is_empty());
    assert_eq!(outcome.report_path, None);
    assert_eq!(
        fs::read(dst.path().join("sub/b.txt")).expect("read copied b"),
        b"source-b"
    );
    assert_eq!(
        fs::read(dst.path().join("a.txt")).expect("read untouched a"),
        b"dest-a",
        "existing destination files are never overwritten"
    );
    assert!(!dst.path().join(REPORT_FILE_NAME).exists());
}

#[test]
fn test_mirror_disjoint_trees_copy_everything() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");

    fs::create_dir_all(src.path().join("x/y")).expect("create source dirs");
    fs::write(src.path().join("one.txt"), b"1").expect("write one");
    fs::write(src.path().join("x/two.txt"), b"2").expect("write two");
    fs::write(src.path().join("x/y/three.txt"), b"3").expect("write three");
    fs::write(dst.path().join("unrelated.txt"), b"u").expect("write unrelated");

    let outcome = run(config_for(src.path(), dst.path())).expect("mirror run should succeed");

    assert_eq!(outcome.copied, 3);
    assert_eq!(outcome.skipped, 0);
    assert!(dst.path().join("one.txt").exists());
    assert!(dst.path().join("x/two.txt").exists());
    assert!(dst.path().join("x/y/three.txt").exists());
    assert!(dst.path().join("unrelated.txt").exists());
}

#[test]
fn test_mirror_second_run_is_a_no_op() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");

    fs::create_dir_all(src.path().join("nested")).expect("create nested dir");
    fs::write(src.path().join("root.txt"), b"root").expect("write root");
    fs::write(src.path().join("nested/inner.txt"), b"inner").expect("write inner");

    let first = run(config_for(src.path(), dst.path())).expect("first run");
    assert_eq!(first.copied, 2);

    let second = run(config_for(src.path(), dst.path())).expect("second run");
    assert_eq!(second.copied, 0);
    assert_eq!(second.skipped, 2);
    assert!(second.collisions.is_empty());
    assert!(!dst.path().join(REPORT_FILE_NAME).exists());
}

#[test]
fn test_mirror_creates_missing_destination() {
    let src = TempDir::new().expect("create src tempdir");
    let parent = TempDir::new().expect("create parent tempdir");
    let destination = parent.path().join("backup/drive");

    fs::write(src.path().join("file.txt"), b"content").expect("write source file");

    let outcome = run(config_for(src.path(), &destination)).expect("run should succeed");

    assert_eq!(outcome.copied, 1);
    assert!(destination.join("file.txt").exists());
}

#[test]
fn test_mirror_collision_with_directory_is_renamed_and_reported() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");

    // A directory is not a file, so `photo` is missing from the destination
    // tree but its name is taken
    fs::write(src.path().join("photo"), b"image-bytes").expect("write source photo");
    fs::create_dir(dst.path().join("photo")).expect("create destination dir");

    let outcome = run(config_for(src.path(), dst.path())).expect("run should succeed");

    assert_eq!(outcome.copied, 1);
    assert_eq!(
        fs::read(dst.path().join("photo(1)")).expect("read renamed copy"),
        b"image-bytes"
    );

    let records = outcome.collisions.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].original, "photo");
    assert_eq!(records[0].renamed_to.as_deref(), Some("photo(1)"));

    let report_path = dst.path().join(REPORT_FILE_NAME);
    assert_eq!(outcome.report_path.as_deref(), Some(report_path.as_path()));
    let report = fs::read_to_string(&report_path).expect("read report");
    assert!(report.starts_with("Files that already existed at the destination:"));
    assert!(report.contains("renamed to: photo(1)"));
}

#[test]
fn test_protected_directories_are_never_copied() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");

    fs::create_dir_all(src.path().join("$RECYCLE.BIN")).expect("create recycle bin");
    fs::create_dir_all(src.path().join("data/system volume information"))
        .expect("create nested protected dir");
    fs::write(src.path().join("$RECYCLE.BIN/deleted.txt"), b"x").expect("write recycled");
    fs::write(
        src.path().join("data/system volume information/index.dat"),
        b"y",
    )
    .expect("write protected");
    fs::write(src.path().join("data/keep.txt"), b"keep").expect("write keep");

    let outcome = run(config_for(src.path(), dst.path())).expect("run should succeed");

    assert_eq!(outcome.copied, 1);
    assert!(dst.path().join("data/keep.txt").exists());
    assert!(!dst.path().join("$RECYCLE.BIN").exists());
    assert!(!dst.path().join("data/system volume information").exists());
}

#[test]
fn test_exclude_patterns_are_respected() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");

    fs::write(src.path().join("keep.txt"), b"keep").expect("write keep file");
    fs::write(src.path().join("ignore.log"), b"ignore").expect("write excluded log file");

    let mut config = config_for(src.path(), dst.path());
    config.exclude_patterns = vec!["*.log".to_string()];

    run(config).expect("run with excludes should succeed");

    assert!(dst.path().join("keep.txt").exists());
    assert!(
        !dst.path().join("ignore.log").exists(),
        "excluded file should not be copied"
    );
}

#[test]
fn test_by_date_files_into_month_bucket() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");

    let report = src.path().join("report.txt");
    fs::write(&report, b"march").expect("write source report");
    set_local_mtime(&report, 2024, 3, 15);

    let outcome = run(date_config_for(src.path(), dst.path())).expect("date run should succeed");

    assert_eq!(outcome.copied, 1);
    assert!(outcome.collisions.is_empty());
    assert_eq!(
        fs::read(dst.path().join("2024/3_March/report.txt")).expect("read bucketed copy"),
        b"march"
    );
}

#[test]
fn test_by_date_flattens_source_subdirectories() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");

    fs::create_dir_all(src.path().join("camera/day1")).expect("create source dirs");
    let photo = src.path().join("camera/day1/img.jpg");
    fs::write(&photo, b"jpeg").expect("write photo");
    set_local_mtime(&photo, 2023, 12, 24);

    run(date_config_for(src.path(), dst.path())).expect("date run should succeed");

    assert!(dst.path().join("2023/12_December/img.jpg").exists());
    assert!(!dst.path().join("camera").exists());
}

#[test]
fn test_by_date_uses_portuguese_month_names() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");

    let file = src.path().join("nota.txt");
    fs::write(&file, b"ola").expect("write source file");
    set_local_mtime(&file, 2024, 3, 1);

    let config = Config {
        month_names: MonthLocale::Portuguese.names(),
        ..date_config_for(src.path(), dst.path())
    };
    run(config).expect("date run should succeed");

    assert!(dst.path().join("2024/3_Março/nota.txt").exists());
}

#[test]
fn test_by_date_collision_is_renamed_with_one_record() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");

    let report = src.path().join("report.txt");
    fs::write(&report, b"second").expect("write source report");
    set_local_mtime(&report, 2024, 3, 15);

    fs::create_dir_all(dst.path().join("2024/3_March")).expect("create bucket");
    fs::write(dst.path().join("2024/3_March/report.txt"), b"first").expect("write existing");

    let outcome = run(date_config_for(src.path(), dst.path())).expect("date run should succeed");

    assert_eq!(
        fs::read(dst.path().join("2024/3_March/report.txt")).expect("read original"),
        b"first"
    );
    assert_eq!(
        fs::read(dst.path().join("2024/3_March/report(1).txt")).expect("read renamed"),
        b"second"
    );

    let records = outcome.collisions.records();
    assert_eq!(records.len(), 1, "one record per collision, not two");
    assert_eq!(records[0].original, "report.txt");
    assert_eq!(records[0].renamed_to.as_deref(), Some("report(1).txt"));

    let report_path = outcome.report_path.expect("report should be written");
    let name = report_path
        .file_name()
        .and_then(|n| n.to_str())
        .expect("utf-8 report name");
    assert!(name.starts_with("existing_files_"), "got {name}");
    assert!(name.ends_with(".txt"), "got {name}");
    assert_eq!(report_path.parent(), Some(dst.path()));
    assert!(report_path.exists());
}

#[test]
fn test_by_date_rerun_renames_every_file() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");

    let file = src.path().join("a.txt");
    fs::write(&file, b"a").expect("write source file");
    set_local_mtime(&file, 2022, 7, 4);

    run(date_config_for(src.path(), dst.path())).expect("first run");
    let second = run(date_config_for(src.path(), dst.path())).expect("second run");

    assert_eq!(second.copied, 1);
    assert_eq!(second.collisions.renamed_count(), 1);
    assert!(dst.path().join("2022/7_July/a(1).txt").exists());
}

#[test]
fn test_dry_run_makes_no_changes() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");

    fs::write(src.path().join("new.txt"), b"should-not-copy").expect("write source new file");
    fs::write(dst.path().join("old.txt"), b"keep").expect("write destination old file");

    let mut config = config_for(src.path(), dst.path());
    config.dry_run = true;

    let outcome = run(config).expect("dry-run should succeed");

    assert_eq!(outcome.copied, 0);
    assert!(!dst.path().join("new.txt").exists());
    assert!(dst.path().join("old.txt").exists());
    assert!(!dst.path().join(REPORT_FILE_NAME).exists());
}

#[test]
fn test_dry_run_does_not_create_destination_or_buckets() {
    let src = TempDir::new().expect("create src tempdir");
    let parent = TempDir::new().expect("create parent tempdir");
    let destination = parent.path().join("not-yet");

    let file = src.path().join("a.txt");
    fs::write(&file, b"a").expect("write source file");
    set_local_mtime(&file, 2024, 1, 2);

    let config = Config {
        dry_run: true,
        ..date_config_for(src.path(), &destination)
    };
    run(config).expect("dry-run should succeed");

    assert!(!destination.exists());
}

#[test]
fn test_strict_missing_source_is_fatal() {
    let parent = TempDir::new().expect("create parent tempdir");
    let dst = TempDir::new().expect("create dst tempdir");
    let source = parent.path().join("unplugged-drive");

    let err = run(config_for(&source, dst.path())).expect_err("strict run must fail");

    assert!(matches!(err, SyncError::SourceNotFound { .. }));
    assert_eq!(
        fs::read_dir(dst.path()).expect("list destination").count(),
        0,
        "nothing may be written after a fatal start"
    );
}

#[test]
fn test_permissive_missing_source_copies_nothing() {
    let parent = TempDir::new().expect("create parent tempdir");
    let dst = TempDir::new().expect("create dst tempdir");

    let config = Config {
        policy: FailurePolicy::Permissive,
        ..config_for(&parent.path().join("unplugged-drive"), dst.path())
    };

    let outcome = run(config).expect("permissive run continues");

    assert_eq!(outcome.copied, 0);
    assert!(outcome.is_complete());
}

#[test]
fn test_invalid_config_is_rejected_before_any_write() {
    let src = TempDir::new().expect("create src tempdir");
    fs::write(src.path().join("a.txt"), b"a").expect("write source file");
    let inside = src.path().join("backup");

    let err = run(config_for(src.path(), &inside)).expect_err("nested destination rejected");

    assert!(err.is_config_error());
    assert!(!inside.exists());
}

fn names_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("list dir")
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_mirror_keeps_user_part_file_next_to_copy() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");

    fs::write(src.path().join("video.mp4"), b"finished video").expect("write source video");
    fs::write(dst.path().join("video.mp4.part"), b"partial download").expect("write user part");

    let outcome = run(config_for(src.path(), dst.path())).expect("mirror run should succeed");

    assert_eq!(outcome.copied, 1);
    assert!(outcome.collisions.is_empty());
    assert_eq!(
        fs::read(dst.path().join("video.mp4.part")).expect("user part survives"),
        b"partial download"
    );
    assert_eq!(
        fs::read(dst.path().join("video.mp4")).expect("read copy"),
        b"finished video"
    );
    assert_eq!(names_in(dst.path()), vec!["video.mp4", "video.mp4.part"]);
}

#[test]
fn test_by_date_part_named_file_and_its_base_both_survive() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");

    fs::create_dir_all(src.path().join("x")).expect("create x");
    fs::create_dir_all(src.path().join("y")).expect("create y");
    let part = src.path().join("x/a.txt.part");
    let base = src.path().join("y/a.txt");
    fs::write(&part, b"from x").expect("write x part");
    fs::write(&base, b"from y").expect("write y base");
    set_local_mtime(&part, 2024, 5, 10);
    set_local_mtime(&base, 2024, 5, 11);

    let outcome = run(date_config_for(src.path(), dst.path())).expect("date run should succeed");

    assert_eq!(outcome.copied, 2);
    let bucket = dst.path().join("2024/5_May");
    assert_eq!(names_in(&bucket), vec!["a.txt", "a.txt.part"]);
    assert_eq!(fs::read(bucket.join("a.txt.part")).expect("read part"), b"from x");
    assert_eq!(fs::read(bucket.join("a.txt")).expect("read base"), b"from y");
}

#[test]
#[cfg(target_os = "linux")]
fn test_non_utf8_names_are_copied_byte_for_byte() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");

    let first = OsStr::from_bytes(b"a\xff.txt");
    let second = OsStr::from_bytes(b"a\xfe.txt");
    fs::write(src.path().join(first), b"ff").expect("write first");
    fs::write(src.path().join(second), b"fe").expect("write second");

    let outcome = run(config_for(src.path(), dst.path())).expect("mirror run should succeed");

    assert_eq!(outcome.copied, 2);
    assert!(outcome.collisions.is_empty());
    assert_eq!(fs::read(dst.path().join(first)).expect("read first"), b"ff");
    assert_eq!(fs::read(dst.path().join(second)).expect("read second"), b"fe");
    assert_eq!(fs::read_dir(dst.path()).expect("list dst").count(), 2);

    let again = run(config_for(src.path(), dst.path())).expect("second run");
    assert_eq!(again.copied, 0);
    assert_eq!(again.skipped, 2);
}

#[test]
fn test_strict_abort_still_writes_report_and_keeps_copy_error() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");

    // `a` collides with a directory and is renamed; `sub/b.txt` then needs a
    // directory where a regular file already sits
    fs::write(src.path().join("a"), b"a").expect("write source a");
    fs::create_dir_all(src.path().join("sub")).expect("create source sub");
    fs::write(src.path().join("sub/b.txt"), b"b").expect("write source b");
    fs::create_dir(dst.path().join("a")).expect("create destination dir a");
    fs::write(dst.path().join("sub"), b"not a dir").expect("write destination file sub");

    let err = run(config_for(src.path(), dst.path())).expect_err("strict run must abort");

    assert!(matches!(err, SyncError::DestinationCreate { .. }), "got {err:?}");
    assert_eq!(fs::read(dst.path().join("a(1)")).expect("read renamed a"), b"a");
    let report = fs::read_to_string(dst.path().join(REPORT_FILE_NAME)).expect("report written");
    assert!(report.contains("renamed to: a(1)"), "report was: {report}");
}

#[test]
fn test_copy_error_wins_over_report_error() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");

    fs::write(src.path().join("a"), b"a").expect("write source a");
    fs::create_dir_all(src.path().join("sub")).expect("create source sub");
    fs::write(src.path().join("sub/b.txt"), b"b").expect("write source b");
    fs::create_dir(dst.path().join("a")).expect("create destination dir a");
    fs::write(dst.path().join("sub"), b"not a dir").expect("write destination file sub");
    // The report path is taken by a directory, so the report fails too
    fs::create_dir(dst.path().join(REPORT_FILE_NAME)).expect("block report path");

    let err = run(config_for(src.path(), dst.path())).expect_err("strict run must abort");

    assert!(matches!(err, SyncError::DestinationCreate { .. }), "got {err:?}");
}

#[test]
fn test_report_failure_fails_only_strict_runs() {
    let blocked_run = |policy: FailurePolicy| {
        let src = TempDir::new().expect("create src tempdir");
        let dst = TempDir::new().expect("create dst tempdir");
        fs::write(src.path().join("photo"), b"image").expect("write source photo");
        fs::create_dir(dst.path().join("photo")).expect("create destination dir");
        fs::create_dir(dst.path().join(REPORT_FILE_NAME)).expect("block report path");

        let result = run(Config {
            policy,
            ..config_for(src.path(), dst.path())
        });
        let copied = fs::read(dst.path().join("photo(1)")).expect("copy kept");
        assert_eq!(copied, b"image");
        result
    };

    let err = blocked_run(FailurePolicy::Strict).expect_err("strict run must fail");
    assert!(matches!(err, SyncError::Report { .. }), "got {err:?}");

    let outcome = blocked_run(FailurePolicy::Permissive).expect("permissive run succeeds");
    assert_eq!(outcome.copied, 1);
    assert_eq!(outcome.report_path, None);
    assert_eq!(outcome.collisions.len(), 1);
}

#[test]
#[cfg(unix)]
fn test_permissive_records_per_file_failure_and_continues() {
    use std::os::unix::fs::PermissionsExt;

    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");

    fs::create_dir_all(src.path().join("locked")).expect("create source locked");
    fs::write(src.path().join("locked/x.txt"), b"x").expect("write locked x");
    fs::write(src.path().join("ok.txt"), b"ok").expect("write ok");

    let locked = dst.path().join("locked");
    fs::create_dir(&locked).expect("create destination locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).expect("chmod locked");

    // Privileged users write through the mode bits; nothing to observe then
    let writable = fs::write(locked.join("check"), b"").is_ok();
    if writable {
        let _ = fs::remove_file(locked.join("check"));
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).expect("restore mode");
        return;
    }

    let result = run(Config {
        policy: FailurePolicy::Permissive,
        ..config_for(src.path(), dst.path())
    });
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).expect("restore mode");
    let outcome = result.expect("permissive run succeeds");

    assert_eq!(outcome.copied, 1);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].kind, "Permission denied");
    assert_eq!(outcome.failures[0].path.as_path(), Path::new("locked/x.txt"));
    assert!(!outcome.is_complete());
    assert_eq!(fs::read(dst.path().join("ok.txt")).expect("read ok"), b"ok");
}

#[test]
fn test_by_date_same_name_from_two_folders() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");

    fs::create_dir_all(src.path().join("a")).expect("create a");
    fs::create_dir_all(src.path().join("b")).expect("create b");
    let first = src.path().join("a/img.jpg");
    let second = src.path().join("b/img.jpg");
    fs::write(&first, b"from a").expect("write a img");
    fs::write(&second, b"from b").expect("write b img");
    set_local_mtime(&first, 2021, 8, 1);
    set_local_mtime(&second, 2021, 8, 20);

    let outcome = run(date_config_for(src.path(), dst.path())).expect("date run should succeed");

    let bucket = dst.path().join("2021/8_August");
    assert_eq!(fs::read(bucket.join("img.jpg")).expect("read img"), b"from a");
    assert_eq!(fs::read(bucket.join("img(1).jpg")).expect("read img(1)"), b"from b");

    let records = outcome.collisions.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].original, "img.jpg");
    assert_eq!(records[0].existing, bucket.join("img.jpg"));
    assert_eq!(records[0].renamed_to.as_deref(), Some("img(1).jpg"));
}
