//! # Configuration Hot Reload
//!
//! Watches a property file and re-applies it to a [`ConfigRegistry`] every
//! time it changes.

use crate::loader::ConfigRegistry;
use hotconf_errors::LoadError;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::{Receiver, Sender};
use tracing::debug;
use tracing::{error, info, warn};

/// Configuration reload event.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigReloadEvent {
    Ready,

    /// File was re-read and bound to every registered class
    Applied {
        path: PathBuf,
        changed: usize,
        invalid: usize,
    },

    /// Configuration file was removed; live values are kept
    Removed(PathBuf),

    /// Configuration reload error
    Error {
        path: PathBuf,
        error: String,
    },
}

/// Watch a property file and rebind it on change.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Monitors the file with `notify` and calls [`ConfigRegistry::load_file`]
/// on every create or modify event. Each pass is reported on the returned
/// channel. The watcher stops when the receiver is dropped.
///
/// ## Usage
/// ```rust,no_run
/// use hotconf::{ConfigRegistry, Registry, Settings, hot_reload::ConfigReloadEvent, watch_config};
/// use std::sync::Arc;
/// use tokio::signal;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let configs = Arc::new(ConfigRegistry::new(Arc::new(Registry::default()), Settings::default()));
///     let path = std::path::Path::new("app.ini");
///     let (_tx, mut rx) = watch_config(Arc::clone(&configs), path).await?;
///
///     loop {
///         tokio::select! {
///             _ = signal::ctrl_c() => break,
///             Some(event) = rx.recv() => {
///                 match event {
///                     ConfigReloadEvent::Applied { changed, .. } => {
///                         println!("{} field(s) updated", changed);
///                     }
///                     ConfigReloadEvent::Error { path, error } => {
///                         eprintln!("Error reloading {:?}: {}", path, error);
///                     }
///                     _ => {}
///                 }
///             }
///         }
///     }
///
///     Ok(())
/// }
/// ```
///
/// ## Event Types
/// - `Ready`: Watcher installed
/// - `Applied`: File re-read and bound
/// - `Removed`: File deleted
/// - `Error`: File could not be read or parsed
///
/// ## Watch Scope
/// The parent directory is watched so editors that replace the file on save
/// keep triggering reloads. Events for sibling files are ignored.
pub async fn watch_config(
    configs: Arc<ConfigRegistry>,
    config_path: &Path,
) -> Result<(Sender<ConfigReloadEvent>, Receiver<ConfigReloadEvent>), LoadError> {
    let config_path = config_path.to_path_buf();

    if !config_path.exists() {
        return Err(LoadError::FileNotFound {
            path: config_path.display().to_string(),
        });
    }
    let file_name = config_path.file_name().map(|n| n.to_os_string());
    let watch_dir = match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let (tx, rx) = tokio::sync::mpsc::channel(100);
    let tx_task = tx.clone();
    let path_task = config_path.clone();

    tokio::spawn(async move {
        let (event_tx, mut event_rx) = tokio::sync::mpsc::channel(100);
        let mut watcher = match RecommendedWatcher::new(
            move |res| {
                let _ = event_tx.blocking_send(res);
            },
            notify::Config::default(),
        ) {
            Ok(w) => w,
            Err(e) => {
                let error_msg = format!("Failed to create file watcher: {}", e);
                error!("{}", error_msg);

                let _ = tx_task
                    .send(ConfigReloadEvent::Error {
                        path: path_task,
                        error: error_msg,
                    })
                    .await;

                return;
            }
        };

        if let Err(e) = watcher.watch(&watch_dir, RecursiveMode::NonRecursive) {
            let error_msg = format!("Failed to watch config file: {}", e);
            error!("{}", error_msg);

            let _ = tx_task
                .send(ConfigReloadEvent::Error {
                    path: path_task,
                    error: error_msg,
                })
                .await;

            return;
        }

        info!("Watching config file: {:?}", config_path);

        let _ = tx_task.send(ConfigReloadEvent::Ready).await;

        loop {
            tokio::select! {
                _ = tx_task.closed() => {
                    debug!("Receiver dropped, stopping watcher for {:?}", config_path);
                    break;
                }
                event_result = event_rx.recv() => {
                    let Some(event_result) = event_result else {
                        break;
                    };

                    match event_result {
                        Ok(event) => {
                            let targets_file = event
                                .paths
                                .iter()
                                .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                            if !targets_file {
                                continue;
                            }
                            let reload_event = match event.kind {
                                EventKind::Create(_) | EventKind::Modify(_) => {
                                    reload(&configs, &config_path)
                                }
                                EventKind::Remove(_) => {
                                    warn!("Config file removed: {:?}", config_path);
                                    ConfigReloadEvent::Removed(config_path.clone())
                                }
                                _ => {
                                    debug!("Ignoring event: {:?}", event.kind);
                                    continue;
                                }
                            };

                            if let Err(e) = tx_task.send(reload_event).await {
                                error!("Failed to send config reload event: {}", e);
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("Watch error: {}", e);
                        }
                    }
                }
            }
        }
    });

    Ok((tx, rx))
}

fn reload(configs: &ConfigRegistry, path: &Path) -> ConfigReloadEvent {
    match configs.load_file(path) {
        Ok(reports) => {
            let changed = reports
                .iter()
                .filter(|r| r.committed)
                .map(|r| r.changed().count())
                .sum();
            let invalid = reports.iter().map(|r| r.invalid().count()).sum();
            info!("Config file updated: {:?}", path);
            ConfigReloadEvent::Applied {
                path: path.to_path_buf(),
                changed,
                invalid,
            }
        }
        Err(e) => {
            warn!("Failed to reload {:?}: {}", path, e);
            ConfigReloadEvent::Error {
                path: path.to_path_buf(),
                error: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecRegistry;
    use crate::descriptor::{ScalarType, TypeDescriptor};
    use crate::registry::{Registry, TypeRegistry};
    use crate::schema::{ClassSchema, FieldSchema};
    use crate::settings::Settings;
    use crate::value::Value;
    use std::fs;
    use tokio::time::Duration;

    fn configs() -> Arc<ConfigRegistry> {
        let mut types = TypeRegistry::new();
        types.register_class(
            ClassSchema::new("app.Server")
                .field(FieldSchema::new("port", TypeDescriptor::Primitive(ScalarType::Int)).with_default(8080)),
        );
        let registry = Arc::new(Registry::new(types, CodecRegistry::new()));
        let configs = ConfigRegistry::new(registry, Settings::default());
        configs.register("app.Server").unwrap();
        Arc::new(configs)
    }

    async fn next_event(rx: &mut Receiver<ConfigReloadEvent>) -> ConfigReloadEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("Timeout waiting for reload event")
            .expect("No event received")
    }

    #[test]
    fn test_config_reload_event_partial_eq() {
        let path1 = PathBuf::from("/test/app.ini");
        let path2 = PathBuf::from("/test/app.ini");
        let path3 = PathBuf::from("/other/app.ini");

        assert_eq!(
            ConfigReloadEvent::Removed(path1.clone()),
            ConfigReloadEvent::Removed(path2.clone())
        );
        assert_ne!(
            ConfigReloadEvent::Removed(path1.clone()),
            ConfigReloadEvent::Removed(path3)
        );
        assert_ne!(
            ConfigReloadEvent::Applied {
                path: path1.clone(),
                changed: 1,
                invalid: 0
            },
            ConfigReloadEvent::Applied {
                path: path2,
                changed: 0,
                invalid: 0
            }
        );
        assert_ne!(
            ConfigReloadEvent::Error {
                path: path1.clone(),
                error: "error1".to_string()
            },
            ConfigReloadEvent::Error {
                path: path1,
                error: "error2".to_string()
            }
        );
    }

    #[test]
    fn test_reload_reports_changes() {
        let configs = configs();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.ini");
        fs::write(&path, "port=9090\n").unwrap();

        let event = reload(&configs, &path);
        assert_eq!(
            event,
            ConfigReloadEvent::Applied {
                path: path.clone(),
                changed: 1,
                invalid: 0
            }
        );
        let live = configs.get("app.Server").unwrap();
        assert_eq!(live.get("port"), Some(Value::Int(9090)));
    }

    #[test]
    fn test_reload_reports_invalid_fields() {
        let configs = configs();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.ini");
        fs::write(&path, "port=ninety\n").unwrap();

        let event = reload(&configs, &path);
        assert!(matches!(
            event,
            ConfigReloadEvent::Applied {
                changed: 0,
                invalid: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_reload_unsupported_file_is_error() {
        let configs = configs();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.json");
        fs::write(&path, "{}").unwrap();

        assert!(matches!(
            reload(&configs, &path),
            ConfigReloadEvent::Error { .. }
        ));
    }

    #[tokio::test]
    async fn test_watch_config_applies_changes() {
        let configs = configs();
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("app.ini");
        fs::write(&config_path, "port=8080\n").unwrap();

        let (_tx, mut rx) = watch_config(Arc::clone(&configs), &config_path)
            .await
            .unwrap();
        assert_eq!(next_event(&mut rx).await, ConfigReloadEvent::Ready);

        fs::write(&config_path, "port=9191\n").unwrap();

        // A single write may surface as several modify events.
        loop {
            match next_event(&mut rx).await {
                ConfigReloadEvent::Applied { changed, .. } if changed > 0 => break,
                ConfigReloadEvent::Applied { .. } => continue,
                other => panic!("Expected Applied event, got {:?}", other),
            }
        }
        let live = configs.get("app.Server").unwrap();
        assert_eq!(live.get("port"), Some(Value::Int(9191)));
    }

    #[tokio::test]
    async fn test_watch_config_ignores_sibling_files() {
        let configs = configs();
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("app.ini");
        fs::write(&config_path, "port=8080\n").unwrap();

        let (_tx, mut rx) = watch_config(Arc::clone(&configs), &config_path)
            .await
            .unwrap();
        assert_eq!(next_event(&mut rx).await, ConfigReloadEvent::Ready);

        fs::write(temp_dir.path().join("other.ini"), "port=1\n").unwrap();

        let event = tokio::time::timeout(Duration::from_millis(500), rx.recv()).await;
        assert!(event.is_err());
        let live = configs.get("app.Server").unwrap();
        assert_eq!(live.get("port"), Some(Value::Int(8080)));
    }

    #[tokio::test]
    async fn test_watch_config_nonexistent_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.ini");

        let result = watch_config(configs(), &config_path).await;
        assert!(matches!(result, Err(LoadError::FileNotFound { .. })));
    }

    #[tokio::test]
    async fn test_watch_config_removed_file() {
        let configs = configs();
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("app.ini");
        fs::write(&config_path, "port=8080\n").unwrap();

        let (_tx, mut rx) = watch_config(Arc::clone(&configs), &config_path)
            .await
            .unwrap();
        assert_eq!(next_event(&mut rx).await, ConfigReloadEvent::Ready);

        fs::remove_file(&config_path).unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
        if let Ok(Some(event)) = event {
            match event {
                ConfigReloadEvent::Removed(path) => assert_eq!(path, config_path),
                ConfigReloadEvent::Error { path, error } => {
                    assert_eq!(path, config_path);
                    assert!(!error.is_empty());
                }
                _ => {}
            }
        }
        let live = configs.get("app.Server").unwrap();
        assert_eq!(live.get("port"), Some(Value::Int(8080)));
    }

    #[tokio::test]
    async fn test_watch_config_stops_when_receiver_dropped() {
        let configs = configs();
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("app.ini");
        fs::write(&config_path, "port=8080\n").unwrap();

        let (tx, mut rx) = watch_config(configs, &config_path).await.unwrap();
        let _ = next_event(&mut rx).await;

        drop(rx);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(tx.is_closed());
    }
}
