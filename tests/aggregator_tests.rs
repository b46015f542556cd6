//! Load lifecycle integration tests for the source aggregator.

use presto::config::Settings;
use presto::core::{LoadPhase, SourceAggregator};

use rand::{Rng, rng};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::{TempDir, tempdir};

fn write_url(dir: &Path, name: &str, url: &str) -> std::io::Result<()> {
    fs::write(
        dir.join(name),
        format!("[InternetShortcut]\nURL={url}\n"),
    )
}

/// Builds a Settings value whose roots and lists dir live inside `dir`.
fn settings_for(dir: &TempDir, roots: &[&Path], busy: &str) -> Settings {
    let lists_dir = dir.path().join("lists");
    fs::create_dir_all(&lists_dir).expect("lists dir");

    let roots_toml: Vec<String> = roots
        .iter()
        .map(|r| format!("{:?}", r.to_string_lossy()))
        .collect();
    let config_path = dir.path().join("presto.toml");
    fs::write(
        &config_path,
        format!(
            "[sources]\nshortcut_roots = [{}]\nlists_dir = {:?}\n\n[activation]\non_busy = \"{}\"\nbusy_wait_ms = 2000\n",
            roots_toml.join(", "),
            lists_dir.to_string_lossy(),
            busy,
        ),
    )
    .expect("config write");
    Settings::load_from(&config_path)
}

#[test]
fn pass_merges_roots_in_configured_order() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let machine_root = dir.path().join("machine");
    let user_root = dir.path().join("user");
    fs::create_dir_all(machine_root.join("Vendor"))?;
    fs::create_dir_all(&user_root)?;

    write_url(&machine_root.join("Vendor"), "Docs.url", "https://docs.example.org")?;
    write_url(&user_root, "Home.url", "https://home.example.org")?;

    let settings = settings_for(&dir, &[&machine_root, &user_root], "wait");
    let aggregator = SourceAggregator::new(&settings);

    assert_eq!(aggregator.phase(), LoadPhase::Idle);
    assert!(aggregator.begin_load());
    assert_eq!(aggregator.wait(Duration::from_secs(5)), LoadPhase::Loaded);
    assert!(aggregator.is_loaded());

    let lists = aggregator.lists();
    let titles: Vec<&str> = lists.executables().iter().map(|e| e.title()).collect();
    assert_eq!(titles, vec!["Docs", "Home"]);
    assert!(lists.web_entries().is_empty());
    Ok(())
}

#[test]
fn json_lists_merge_behind_the_shortcut_scan() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let root = dir.path().join("menu");
    fs::create_dir_all(&root)?;
    write_url(&root, "Docs.url", "https://docs.example.org")?;

    let settings = settings_for(&dir, &[&root], "wait");
    fs::write(
        settings.lists_dir().join("uwp_list.json"),
        r#"[{"name": "Calculator", "key": "calc", "uri": "shell:AppsFolder\\calc"}]"#,
    )?;
    fs::write(
        settings.lists_dir().join("search_list.json"),
        r#"[{"name": "Example", "key": "g", "uri": "https://example.com/?q={word}"}]"#,
    )?;

    let aggregator = SourceAggregator::new(&settings);
    aggregator.begin_load();
    assert_eq!(aggregator.wait(Duration::from_secs(5)), LoadPhase::Loaded);

    let lists = aggregator.lists();
    assert_eq!(lists.shortcut_count(), 1);
    let titles: Vec<&str> = lists.executables().iter().map(|e| e.title()).collect();
    assert_eq!(titles, vec!["Docs", "Calculator"]);
    assert_eq!(lists.web_entries().len(), 1);
    assert_eq!(lists.web_entries()[0].subtitle(), "g");
    Ok(())
}

#[test]
fn second_begin_load_while_loading_is_a_noop() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let root = dir.path().join("menu");
    // Enough files that the pass is still running when the second call lands.
    for sub in 0..20 {
        let subdir = root.join(format!("vendor_{sub:02}"));
        fs::create_dir_all(&subdir)?;
        for i in 0..40 {
            write_url(&subdir, &format!("site_{i:02}.url"), "https://example.org")?;
        }
    }

    let settings = settings_for(&dir, &[&root], "wait");
    let aggregator = SourceAggregator::new(&settings);

    assert!(aggregator.begin_load());
    assert!(!aggregator.begin_load());
    assert!(!aggregator.begin_load());

    assert_eq!(aggregator.wait(Duration::from_secs(10)), LoadPhase::Loaded);
    // One pass ran: every file shows up exactly once.
    assert_eq!(aggregator.lists().executables().len(), 20 * 40);
    Ok(())
}

#[test]
fn cancel_leaves_previous_lists_untouched() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let root = dir.path().join("menu");
    fs::create_dir_all(&root)?;
    for i in 0..200 {
        write_url(&root, &format!("site_{i:03}.url"), "https://example.org")?;
    }

    let settings = settings_for(&dir, &[&root], "wait");
    let aggregator = SourceAggregator::new(&settings);

    aggregator.begin_load();
    assert_eq!(aggregator.wait(Duration::from_secs(10)), LoadPhase::Loaded);
    let cached = aggregator.lists();
    assert_eq!(cached.executables().len(), 200);

    // Cancel the second pass right away.
    aggregator.begin_load();
    aggregator.cancel();
    let phase = aggregator.wait(Duration::from_secs(10));
    assert_eq!(phase, LoadPhase::Cancelled);
    assert!(!aggregator.is_loaded());

    // The published collections are still the first pass's.
    assert!(Arc::ptr_eq(&cached, &aggregator.lists()));
    Ok(())
}

#[test]
fn bounded_wait_cancels_an_overrunning_pass() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let root = dir.path().join("menu");
    for sub in 0..30 {
        let subdir = root.join(format!("vendor_{sub:02}"));
        fs::create_dir_all(&subdir)?;
        for i in 0..60 {
            write_url(&subdir, &format!("site_{i:02}.url"), "https://example.org")?;
        }
    }

    // A 1ms budget cannot cover the walk; the activation must decline.
    let lists_dir = dir.path().join("lists");
    fs::create_dir_all(&lists_dir)?;
    let config_path = dir.path().join("presto.toml");
    fs::write(
        &config_path,
        format!(
            "[sources]\nshortcut_roots = [{:?}]\nlists_dir = {:?}\n\n[activation]\non_busy = \"wait\"\nbusy_wait_ms = 1\n",
            root.to_string_lossy(),
            lists_dir.to_string_lossy(),
        ),
    )?;
    let settings = Settings::load_from(&config_path);

    let aggregator = SourceAggregator::new(&settings);
    let phase = aggregator.ensure_loaded();
    assert_eq!(phase, LoadPhase::Cancelled);
    assert!(!aggregator.is_loaded());
    assert!(aggregator.lists().executables().is_empty());
    Ok(())
}

#[test]
fn reload_lists_skips_the_filesystem_walk() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let root = dir.path().join("menu");
    fs::create_dir_all(&root)?;
    write_url(&root, "Docs.url", "https://docs.example.org")?;

    let settings = settings_for(&dir, &[&root], "wait");
    fs::write(
        settings.lists_dir().join("search_list.json"),
        r#"[{"name": "Example", "key": "g", "uri": "https://example.com/?q={word}"}]"#,
    )?;

    let aggregator = SourceAggregator::new(&settings);
    aggregator.begin_load();
    assert_eq!(aggregator.wait(Duration::from_secs(5)), LoadPhase::Loaded);

    // Change the JSON lists and delete the shortcut source; a JSON-only
    // reload must keep the scanned entry and pick up the new lists.
    fs::write(
        settings.lists_dir().join("search_list.json"),
        r#"[{"name": "Wiki", "key": "w", "uri": "https://wiki.example.org/{word}"}]"#,
    )?;
    fs::write(
        settings.lists_dir().join("uwp_list.json"),
        r#"[{"name": "Terminal", "key": "term", "uri": "shell:AppsFolder\\term"}]"#,
    )?;
    fs::remove_file(root.join("Docs.url"))?;

    aggregator.reload_lists();

    let lists = aggregator.lists();
    let titles: Vec<&str> = lists.executables().iter().map(|e| e.title()).collect();
    assert_eq!(titles, vec!["Docs", "Terminal"]);
    assert_eq!(lists.web_entries().len(), 1);
    assert_eq!(lists.web_entries()[0].subtitle(), "w");
    Ok(())
}

#[test]
fn malformed_json_lists_do_not_fail_the_pass() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let root = dir.path().join("menu");
    fs::create_dir_all(&root)?;
    write_url(&root, "Docs.url", "https://docs.example.org")?;

    let settings = settings_for(&dir, &[&root], "wait");
    fs::write(settings.lists_dir().join("search_list.json"), "{ not json ]")?;

    let aggregator = SourceAggregator::new(&settings);
    aggregator.begin_load();
    assert_eq!(aggregator.wait(Duration::from_secs(5)), LoadPhase::Loaded);

    let lists = aggregator.lists();
    assert_eq!(lists.executables().len(), 1);
    assert!(lists.web_entries().is_empty());
    Ok(())
}

#[test]
fn concurrent_load_and_cancel_stress() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let root = dir.path().join("menu");
    fs::create_dir_all(&root)?;
    for i in 0..50 {
        write_url(&root, &format!("site_{i:02}.url"), "https://example.org")?;
    }

    let settings = settings_for(&dir, &[&root], "wait");
    let aggregator = Arc::new(SourceAggregator::new(&settings));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let aggregator = Arc::clone(&aggregator);
        handles.push(thread::spawn(move || {
            let mut rng = rng();
            for _ in 0..25 {
                match rng.random_range(0..3) {
                    0 => {
                        aggregator.begin_load();
                    }
                    1 => aggregator.cancel(),
                    _ => {
                        let lists = aggregator.lists();
                        // Readers never observe a half-built collection.
                        assert!(lists.executables().len() <= 50);
                    }
                }
                thread::sleep(Duration::from_millis(rng.random_range(0..3)));
            }
        }));
    }
    for h in handles {
        h.join().map_err(|e| format!("stress thread panicked: {e:?}"))?;
    }

    // Let whatever is in flight settle, then one clean pass must succeed.
    aggregator.wait(Duration::from_secs(10));
    aggregator.begin_load();
    assert_eq!(aggregator.wait(Duration::from_secs(10)), LoadPhase::Loaded);
    assert_eq!(aggregator.lists().executables().len(), 50);
    Ok(())
}
