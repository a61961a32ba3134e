use rask_log_sink::appender::rolling_file::backup_path;
use rask_log_sink::{Appender, AppenderError, Level, LoggingEvent, RollingFileAppender, RollingFileWriter, SimpleLayout};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

// "INFO - " + 43 chars + "\n" = 51 bytes, so two lines cross a 100 byte limit.
const LINE_LEN: usize = 51;

fn line(tag: char) -> LoggingEvent {
    LoggingEvent::new("rolling", Level::Info, tag.to_string().repeat(43))
}

fn rendered(tags: &[char]) -> String {
    tags.iter()
        .map(|tag| format!("INFO - {}\n", tag.to_string().repeat(43)))
        .collect()
}

fn configured(path: &Path, max_backup_index: &str) -> RollingFileAppender {
    let appender = RollingFileAppender::new("rolling", RollingFileWriter::default());
    appender.set_layout(Arc::new(SimpleLayout));
    appender.set_option("File", &path.to_string_lossy()).unwrap();
    appender.set_option("MaxFileSize", "100").unwrap();
    appender.set_option("MaxBackupIndex", max_backup_index).unwrap();
    appender.activate_options().unwrap();
    appender
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_rollover_shifts_backup_chain() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("app.log");
    let appender = configured(&path, "2");

    appender.do_append(&line('a')).unwrap();
    assert_eq!(appender.bytes_written(), LINE_LEN as u64);
    appender.do_append(&line('b')).unwrap();

    // First rollover
    assert_eq!(read(&backup_path(&path, 1)), rendered(&['a', 'b']));
    assert_eq!(read(&path), "");
    assert_eq!(appender.bytes_written(), 0);
    assert!(!backup_path(&path, 2).exists());

    appender.do_append(&line('c')).unwrap();
    appender.do_append(&line('d')).unwrap();

    // Second rollover promotes the chain
    assert_eq!(read(&backup_path(&path, 2)), rendered(&['a', 'b']));
    assert_eq!(read(&backup_path(&path, 1)), rendered(&['c', 'd']));
    assert_eq!(read(&path), "");

    appender.do_append(&line('e')).unwrap();
    appender.do_append(&line('f')).unwrap();

    // The oldest backup falls off the end
    assert_eq!(read(&backup_path(&path, 2)), rendered(&['c', 'd']));
    assert_eq!(read(&backup_path(&path, 1)), rendered(&['e', 'f']));
    assert!(!backup_path(&path, 3).exists());

    appender.do_append(&line('g')).unwrap();
    assert_eq!(read(&path), rendered(&['g']));
}

#[test]
fn test_zero_backups_truncates_in_place() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("app.log");
    let appender = configured(&path, "0");

    appender.do_append(&line('a')).unwrap();
    appender.do_append(&line('b')).unwrap();

    assert_eq!(read(&path), "");
    assert!(!backup_path(&path, 1).exists());

    appender.do_append(&line('c')).unwrap();
    assert_eq!(read(&path), rendered(&['c']));
}

#[test]
fn test_failed_rollover_keeps_writing_to_current_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("app.log");

    // A directory where the backup should go cannot be removed as a file.
    let blocker = backup_path(&path, 1);
    fs::create_dir(&blocker).unwrap();
    fs::write(blocker.join("keep"), b"x").unwrap();

    let appender = configured(&path, "1");
    appender.do_append(&line('a')).unwrap();

    let result = appender.do_append(&line('b'));
    assert!(matches!(result, Err(AppenderError::Rollover { .. })));

    // Nothing written so far is lost and the appender stays usable.
    assert_eq!(read(&path), rendered(&['a', 'b']));
    assert!(!appender.is_closed());

    // The next attempt waits for another MaxFileSize bytes.
    appender.do_append(&line('c')).unwrap();
    assert_eq!(read(&path), rendered(&['a', 'b', 'c']));
    assert!(matches!(
        appender.do_append(&line('d')),
        Err(AppenderError::Rollover { .. })
    ));

    // Once the obstacle is gone the chain works again.
    fs::remove_dir_all(&blocker).unwrap();
    appender.do_append(&line('e')).unwrap();
    appender.do_append(&line('f')).unwrap();
    assert_eq!(read(&blocker), rendered(&['a', 'b', 'c', 'd', 'e', 'f']));
    assert_eq!(read(&path), "");
}

#[test]
fn test_append_after_close_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("app.log");
    let appender = configured(&path, "1");

    appender.do_append(&line('a')).unwrap();
    appender.close();
    appender.close();

    assert!(matches!(
        appender.do_append(&line('b')),
        Err(AppenderError::Closed(_))
    ));
    assert_eq!(read(&path), rendered(&['a']));
}

#[test]
fn test_concurrent_appends_never_interleave_lines() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("shared.log");
    let appender = Arc::new(
        RollingFileAppender::new("shared", RollingFileWriter::new(&path).with_max_file_size(1024 * 1024))
            .with_layout(Arc::new(SimpleLayout)),
    );
    appender.activate_options().unwrap();

    let handles: Vec<_> = ['x', 'y', 'z', 'w']
        .into_iter()
        .map(|tag| {
            let appender = appender.clone();
            std::thread::spawn(move || {
                for _ in 0..200 {
                    appender.do_append(&line(tag)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let content = read(&path);
    assert_eq!(content.lines().count(), 800);
    for text in content.lines() {
        let first = text.chars().nth(7).unwrap();
        assert_eq!(text, format!("INFO - {}", first.to_string().repeat(43)));
    }
}
