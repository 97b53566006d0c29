/// Request/response contract between the popup or options page and the background engine
use std::collections::HashMap;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::controller::DedupController;
use crate::host::TabHost;
use crate::operations::{close_duplicates, merge_windows};
use crate::pattern::PatternRule;
use crate::registry::{TabRegistry, duplicate_groups};
use crate::storage::{EXPORT_FILE_NAME, Settings, SettingsStore};
use crate::tracking::{TrackingMode, matched_rule};
use crate::url_info::is_privileged;

/// A message sent with `chrome.runtime.sendMessage`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    GetStats,
    AddPattern {
        pattern: PatternRule,
    },
    RemovePattern {
        index: usize,
    },
    GetPatterns,
    GetSettings,
    SetMode {
        mode: TrackingMode,
    },
    ExportSettings,
    /// `contents` is the text of a previously exported file
    ImportSettings {
        contents: String,
    },
    GetTabStatus {
        url: String,
    },
    /// Close duplicates of one group, or of all groups when `group` is absent
    CloseDuplicates {
        #[serde(default)]
        group: Option<String>,
    },
    MergeWindows,
}

/// A tracking key shared by more than one open tab
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup {
    pub group: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum Response {
    Stats {
        group_count: HashMap<String, usize>,
        /// Largest groups first
        duplicates: Vec<DuplicateGroup>,
    },
    PatternsChanged {
        success: bool,
        patterns: Vec<PatternRule>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Patterns {
        patterns: Vec<PatternRule>,
    },
    SettingsChanged {
        success: bool,
        mode: TrackingMode,
        patterns: Vec<PatternRule>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Settings {
        mode: TrackingMode,
        patterns: Vec<PatternRule>,
    },
    ModeChanged {
        success: bool,
        mode: TrackingMode,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Exported {
        contents: String,
        file_name: &'static str,
    },
    TabStatus {
        mode: TrackingMode,
        tracking_key: Option<String>,
        matched_pattern: Option<PatternRule>,
        description: Option<String>,
    },
    Closed {
        success: bool,
        closed: usize,
    },
    Moved {
        success: bool,
        moved: usize,
    },
    Error {
        error: String,
    },
}

impl Response {
    pub fn error(error: impl ToString) -> Response {
        Response::Error {
            error: error.to_string(),
        }
    }

    fn patterns_changed(success: bool, settings: Settings, error: Option<String>) -> Response {
        Response::PatternsChanged {
            success,
            patterns: settings.domain_patterns,
            error,
        }
    }

    fn settings_changed(success: bool, settings: Settings, error: Option<String>) -> Response {
        Response::SettingsChanged {
            success,
            mode: settings.mode,
            patterns: settings.domain_patterns,
            error,
        }
    }
}

impl Request {
    /// Carry out the request against the engine's settings and the open tabs
    pub async fn act<H: TabHost, S: SettingsStore>(
        self,
        controller: &DedupController<H, S>,
    ) -> Response {
        use Request::*;

        let host = controller.host();
        let settings = controller.settings();

        match self {
            GetStats => {
                let counts = match settings.current().await {
                    Ok(current) => TabRegistry::new(host).count_by_key(&current).await,
                    Err(e) => Err(e),
                };
                match counts {
                    Ok(group_count) => {
                        let duplicates = duplicate_groups(&group_count)
                            .into_iter()
                            .map(|(group, count)| DuplicateGroup { group, count })
                            .collect();
                        Response::Stats {
                            group_count,
                            duplicates,
                        }
                    }
                    Err(e) => Response::error(e),
                }
            }

            AddPattern { pattern } => match settings.add_pattern(pattern).await {
                Ok(updated) => Response::patterns_changed(true, updated, None),
                Err(e) => Response::patterns_changed(false, settings.snapshot(), Some(e.to_string())),
            },

            RemovePattern { index } => match settings.remove_pattern(index).await {
                Ok((true, updated)) => Response::patterns_changed(true, updated, None),
                Ok((false, updated)) => Response::patterns_changed(
                    false,
                    updated,
                    Some(format!("no pattern at position {index}")),
                ),
                Err(e) => Response::patterns_changed(false, settings.snapshot(), Some(e.to_string())),
            },

            GetPatterns => match settings.current().await {
                Ok(current) => Response::Patterns {
                    patterns: current.domain_patterns,
                },
                Err(e) => Response::error(e),
            },

            GetSettings => match settings.current().await {
                Ok(current) => Response::Settings {
                    mode: current.mode,
                    patterns: current.domain_patterns,
                },
                Err(e) => Response::error(e),
            },

            SetMode { mode } => match settings.set_mode(mode).await {
                Ok(updated) => Response::ModeChanged {
                    success: true,
                    mode: updated.mode,
                    error: None,
                },
                Err(e) => Response::ModeChanged {
                    success: false,
                    mode: settings.snapshot().mode,
                    error: Some(e.to_string()),
                },
            },

            ExportSettings => match settings.export().await {
                Ok(contents) => Response::Exported {
                    contents,
                    file_name: EXPORT_FILE_NAME,
                },
                Err(e) => Response::error(e),
            },

            ImportSettings { contents } => match settings.import(&contents).await {
                Ok(imported) => Response::settings_changed(true, imported, None),
                Err(e) => Response::settings_changed(false, settings.snapshot(), Some(e.to_string())),
            },

            GetTabStatus { url } => {
                let current = match settings.current().await {
                    Ok(current) => current,
                    Err(e) => return Response::error(e),
                };
                let tracking_key = if is_privileged(&url) {
                    None
                } else {
                    current.resolve(&url).into_key()
                };
                let matched_pattern = match current.mode {
                    TrackingMode::All => None,
                    TrackingMode::Specific => {
                        matched_rule(&url, &current.domain_patterns).cloned()
                    }
                };
                Response::TabStatus {
                    mode: current.mode,
                    tracking_key,
                    description: matched_pattern.as_ref().map(PatternRule::description),
                    matched_pattern,
                }
            }

            CloseDuplicates { group } => {
                let closed = match settings.current().await {
                    Ok(current) => close_duplicates(host, &current, group.as_deref()).await,
                    Err(e) => Err(e),
                };
                match closed {
                    Ok(closed) => Response::Closed {
                        success: true,
                        closed,
                    },
                    Err(e) => {
                        warn!("Closing duplicates failed: {}", e);
                        Response::Closed {
                            success: false,
                            closed: 0,
                        }
                    }
                }
            }

            MergeWindows => match merge_windows(host).await {
                Ok(moved) => Response::Moved {
                    success: true,
                    moved,
                },
                Err(e) => {
                    warn!("Merging windows failed: {}", e);
                    Response::Moved {
                        success: false,
                        moved: 0,
                    }
                }
            },
        }
    }
}
