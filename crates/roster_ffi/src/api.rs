//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose board operations to Dart via FRB as flat, owned DTOs.
//! - Hand the shell a fresh board snapshot after every call so it can redraw.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call loads, mutates and saves the board within one DB connection.

use log::warn;
use roster_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, log_board_settings,
    open_db, ping as ping_inner, BoardConfig, BoardResult, BoardService, BoardSnapshot, DropOutcome,
    IgnoreReason, IntervalNotice, NameChip, NoopRenderSink, PanelId, PanelView, RenameOutcome,
    SqliteStateStore,
};
use std::path::PathBuf;
use std::sync::OnceLock;

const BOARD_DB_FILE_NAME: &str = "roster_board.sqlite3";
static BOARD_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

type Board<'conn> = BoardService<SqliteStateStore<'conn>, NoopRenderSink>;

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => {
            let db_path = resolve_board_db_path();
            log_board_settings(&BoardConfig::default(), &db_path.display().to_string());
            String::new()
        }
        Err(err) => err.to_string(),
    }
}

/// Name chip as drawn by the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfiNameChip {
    pub name: String,
    /// Container id to report as drop source when this chip is dragged.
    pub container_id: String,
    /// `#RRGGBB`, absent when name colors are off.
    pub background: Option<String>,
    pub text_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfiSlot {
    pub index: u32,
    /// `HH:MM` start time.
    pub label: String,
    pub container_id: String,
    pub occupant: Option<FfiNameChip>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfiPanel {
    pub panel_id: u32,
    pub container_id: String,
    pub display_name: String,
    pub interval_minutes: u32,
    pub slots: Vec<FfiSlot>,
    pub category: Vec<FfiNameChip>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfiBoard {
    pub pool: Vec<FfiNameChip>,
    pub panels: Vec<FfiPanel>,
    pub global_interval_minutes: u32,
}

/// Response envelope shared by every board call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardResponse {
    /// Whether the operation succeeded. Ignored drops count as success.
    pub ok: bool,
    /// Human-readable outcome for diagnostics/UI.
    pub message: String,
    /// Panel created by `board_create_panel`.
    pub panel_id: Option<u32>,
    /// Board after the call; absent when the DB could not be opened.
    pub board: Option<FfiBoard>,
}

impl BoardResponse {
    fn success(message: impl Into<String>, panel_id: Option<u32>, board: FfiBoard) -> Self {
        Self {
            ok: true,
            message: message.into(),
            panel_id,
            board: Some(board),
        }
    }

    fn failure(message: impl Into<String>, board: Option<FfiBoard>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            panel_id: None,
            board,
        }
    }
}

/// Returns the current board without changing it.
#[flutter_rust_bridge::frb(sync)]
pub fn board_snapshot() -> BoardResponse {
    with_board("board_snapshot", |_| Ok(("Board loaded.".to_string(), None)))
}

/// Adds a name to the pool.
#[flutter_rust_bridge::frb(sync)]
pub fn board_add_name(name: String) -> BoardResponse {
    with_board("board_add_name", |board| {
        let added = board.add_name(&name)?;
        Ok((format!("Added {added}."), None))
    })
}

/// Removes a name from wherever it is on the board.
#[flutter_rust_bridge::frb(sync)]
pub fn board_remove_name(name: String) -> BoardResponse {
    with_board("board_remove_name", |board| {
        let message = if board.remove_name(&name)? {
            "Name removed."
        } else {
            "Name not found."
        };
        Ok((message.to_string(), None))
    })
}

/// Applies one drag-and-drop gesture between two container ids
/// (`names`, `trash`, `panel-N`, `panel-N-S`).
///
/// # FFI contract
/// - Repeated or self drops succeed with an "Ignored" message and write nothing.
#[flutter_rust_bridge::frb(sync)]
pub fn board_drop(name: String, source_id: String, target_id: String) -> BoardResponse {
    with_board("board_drop", |board| {
        let outcome = board.drop_by_ids(&name, &source_id, &target_id)?;
        Ok((describe_drop(&outcome), None))
    })
}

/// Creates a panel. `interval_minutes` defaults to the board-wide interval.
#[flutter_rust_bridge::frb(sync)]
pub fn board_create_panel(display_name: String, interval_minutes: Option<i64>) -> BoardResponse {
    with_board("board_create_panel", |board| {
        let created = board.create_panel(&display_name, interval_minutes)?;
        let message = with_notice("Panel created.", created.notice.as_ref());
        Ok((message, Some(created.id.get())))
    })
}

/// Deletes a panel; its names return to the pool.
#[flutter_rust_bridge::frb(sync)]
pub fn board_delete_panel(panel_id: u32) -> BoardResponse {
    with_board("board_delete_panel", |board| {
        let freed = board.delete_panel(PanelId::new(panel_id))?;
        Ok((
            format!("Panel deleted; {} name(s) returned.", freed.len()),
            None,
        ))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_rename_panel(panel_id: u32, new_name: String) -> BoardResponse {
    with_board("board_rename_panel", |board| {
        let message = match board.rename_panel(PanelId::new(panel_id), &new_name)? {
            RenameOutcome::Renamed => "Panel renamed.",
            RenameOutcome::Unchanged => "Panel name unchanged.",
        };
        Ok((message.to_string(), None))
    })
}

/// Changes one panel's slot interval. Out-of-range values are clamped and
/// reported in the message.
#[flutter_rust_bridge::frb(sync)]
pub fn board_set_interval(panel_id: u32, minutes: i64) -> BoardResponse {
    with_board("board_set_interval", |board| {
        let change = board.set_interval(PanelId::new(panel_id), minutes)?;
        let message = with_notice(
            &format!(
                "Interval set to {} minutes; {} name(s) returned.",
                change.applied_minutes,
                change.displaced.len()
            ),
            change.notice.as_ref(),
        );
        Ok((message, None))
    })
}

/// Changes the board-wide interval and applies it to every panel.
#[flutter_rust_bridge::frb(sync)]
pub fn board_set_global_interval(minutes: i64) -> BoardResponse {
    with_board("board_set_global_interval", |board| {
        let change = board.set_global_interval(minutes)?;
        let message = with_notice(
            &format!(
                "Global interval set to {} minutes; {} name(s) returned.",
                change.applied_minutes,
                change.displaced.len()
            ),
            change.notice.as_ref(),
        );
        Ok((message, None))
    })
}

fn resolve_board_db_path() -> PathBuf {
    BOARD_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("ROSTER_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(BOARD_DB_FILE_NAME)
        })
        .clone()
}

fn with_board(
    op: &'static str,
    f: impl FnOnce(&mut Board<'_>) -> BoardResult<(String, Option<u32>)>,
) -> BoardResponse {
    let db_path = resolve_board_db_path();
    let conn = match open_db(&db_path) {
        Ok(conn) => conn,
        Err(err) => {
            return BoardResponse::failure(format!("{op} failed: board DB open failed: {err}"), None)
        }
    };
    let store = match SqliteStateStore::try_new(&conn) {
        Ok(store) => store,
        Err(err) => {
            return BoardResponse::failure(
                format!("{op} failed: board store init failed: {err}"),
                None,
            )
        }
    };
    let mut board: Board<'_> =
        match BoardService::open(store, NoopRenderSink, &BoardConfig::default()) {
            Ok(board) => board,
            Err(err) => return BoardResponse::failure(format!("{op} failed: {err}"), None),
        };

    match f(&mut board) {
        Ok((message, panel_id)) => {
            BoardResponse::success(message, panel_id, to_ffi_board(&board.snapshot()))
        }
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error op={op} error={err}");
            BoardResponse::failure(
                format!("{op} failed: {err}"),
                Some(to_ffi_board(&board.snapshot())),
            )
        }
    }
}

fn describe_drop(outcome: &DropOutcome) -> String {
    match outcome {
        DropOutcome::Moved { displaced: None } => "Moved.".to_string(),
        DropOutcome::Moved {
            displaced: Some(previous),
        } => format!("Moved; {previous} returned to names."),
        DropOutcome::Deleted => "Deleted.".to_string(),
        DropOutcome::Ignored(reason) => {
            let why = match reason {
                IgnoreReason::SameLocation => "same location",
                IgnoreReason::AlreadyInSlot => "already in slot",
                IgnoreReason::NotAtSource => "name is no longer at the source",
            };
            format!("Ignored: {why}.")
        }
    }
}

fn with_notice(message: &str, notice: Option<&IntervalNotice>) -> String {
    match notice {
        Some(notice) => format!(
            "{message} Requested {} minutes is out of range; using {}.",
            notice.requested, notice.applied
        ),
        None => message.to_string(),
    }
}

fn to_ffi_board(snapshot: &BoardSnapshot) -> FfiBoard {
    FfiBoard {
        pool: snapshot.pool.iter().map(to_ffi_chip).collect(),
        panels: snapshot.panels.iter().map(to_ffi_panel).collect(),
        global_interval_minutes: snapshot.global_interval_minutes,
    }
}

fn to_ffi_panel(panel: &PanelView) -> FfiPanel {
    FfiPanel {
        panel_id: panel.id.get(),
        container_id: panel.container_id.clone(),
        display_name: panel.display_name.clone(),
        interval_minutes: panel.interval_minutes,
        slots: panel
            .slots
            .iter()
            .map(|slot| FfiSlot {
                index: slot.index as u32,
                label: slot.label.clone(),
                container_id: slot.container_id.clone(),
                occupant: slot.occupant.as_ref().map(to_ffi_chip),
            })
            .collect(),
        category: panel.category.iter().map(to_ffi_chip).collect(),
    }
}

fn to_ffi_chip(chip: &NameChip) -> FfiNameChip {
    FfiNameChip {
        name: chip.name.clone(),
        container_id: chip.container_id.clone(),
        background: chip.background.clone(),
        text_color: chip.text_color.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        board_add_name, board_create_panel, board_delete_panel, board_drop,
        board_set_interval, board_snapshot, core_version, init_logging, ping,
        resolve_board_db_path, BoardResponse, FfiPanel,
    };
    use roster_core::open_db;
    use rusqlite::OptionalExtension;
    use std::sync::Mutex;
    use std::time::{SystemTime, UNIX_EPOCH};

    // Every call rewrites the whole board, so tests sharing the DB run one at a time.
    static BOARD_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn drop_moves_name_into_created_panel_slot() {
        let _guard = BOARD_LOCK.lock().unwrap_or_else(|err| err.into_inner());
        let panel_name = unique_token("ffi-panel");
        let person = unique_token("ffi-name");

        let created = board_create_panel(panel_name, Some(60));
        assert!(created.ok, "{}", created.message);
        let panel_id = created.panel_id.expect("create should return panel_id");

        assert!(board_add_name(person.clone()).ok);
        let target = format!("panel-{panel_id}-3");
        let moved = board_drop(person.clone(), "names".to_string(), target.clone());
        assert!(moved.ok, "{}", moved.message);
        assert_eq!(moved.message, "Moved.");

        let panel = find_panel(&moved, panel_id);
        let occupant = panel.slots[3].occupant.as_ref().expect("slot 3 occupied");
        assert_eq!(occupant.name, person);
        assert_eq!(occupant.container_id, target);
        assert!(occupant.background.is_some());

        let repeated = board_drop(person.clone(), "names".to_string(), target);
        assert!(repeated.ok);
        assert!(repeated.message.starts_with("Ignored"));

        let deleted = board_delete_panel(panel_id);
        assert!(deleted.ok, "{}", deleted.message);
        let board = deleted.board.expect("board snapshot");
        assert!(board.pool.iter().any(|chip| chip.name == person));
    }

    #[test]
    fn interval_is_clamped_and_reported() {
        let _guard = BOARD_LOCK.lock().unwrap_or_else(|err| err.into_inner());
        let created = board_create_panel(unique_token("ffi-interval"), None);
        let panel_id = created.panel_id.expect("create should return panel_id");

        let response = board_set_interval(panel_id, 5);
        assert!(response.ok, "{}", response.message);
        assert!(response.message.contains("out of range"));
        assert_eq!(find_panel(&response, panel_id).slots.len(), 144);

        assert!(board_delete_panel(panel_id).ok);
    }

    #[test]
    fn failures_return_message_and_current_board() {
        let _guard = BOARD_LOCK.lock().unwrap_or_else(|err| err.into_inner());
        let response = board_drop(
            unique_token("ffi-ghost"),
            "names".to_string(),
            "nowhere".to_string(),
        );
        assert!(!response.ok);
        assert!(response.message.starts_with("board_drop failed"));
        assert!(response.board.is_some());

        let blank = board_add_name("   ".to_string());
        assert!(!blank.ok);
    }

    #[test]
    fn board_is_persisted_in_resolved_db() {
        let _guard = BOARD_LOCK.lock().unwrap_or_else(|err| err.into_inner());
        let person = unique_token("ffi-persisted");
        assert!(board_add_name(person.clone()).ok);

        let conn = open_db(resolve_board_db_path()).expect("open db");
        let names: Option<String> = conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = 'scheduleAppNames'",
                [],
                |row| row.get(0),
            )
            .optional()
            .expect("query names row");
        assert!(names.expect("names saved").contains(&person));
        assert!(board_snapshot().ok);
    }

    fn find_panel(response: &BoardResponse, panel_id: u32) -> FfiPanel {
        response
            .board
            .as_ref()
            .expect("board snapshot")
            .panels
            .iter()
            .find(|panel| panel.panel_id == panel_id)
            .cloned()
            .expect("panel present")
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
