use roster_core::{
    BoardConfig, BoardError, BoardService, Location, MemoryStateStore, NoopRenderSink, PanelId,
    RenameOutcome,
};

type Board = BoardService<MemoryStateStore, NoopRenderSink>;

fn empty_board() -> Board {
    BoardService::open(
        MemoryStateStore::new(),
        NoopRenderSink,
        &BoardConfig::default(),
    )
    .unwrap()
}

fn place(board: &mut Board, name: &str, target: Location) {
    board.add_name(name).unwrap();
    board.drop_name(name, &Location::Pool, &target).unwrap();
}

#[test]
fn creating_night_shift_twice_is_rejected() {
    let mut board = empty_board();
    board.create_panel("Night Shift", None).unwrap();

    let err = board.create_panel("  night shift ", None).unwrap_err();
    assert!(matches!(err, BoardError::NameTaken(_)));
    let named = board
        .state()
        .panels()
        .filter(|panel| panel.display_name.eq_ignore_ascii_case("Night Shift"))
        .count();
    assert_eq!(named, 1);
}

#[test]
fn blank_panel_names_are_rejected() {
    let mut board = empty_board();
    assert!(matches!(
        board.create_panel("   ", None),
        Err(BoardError::EmptyPanelName)
    ));
    assert_eq!(board.state().panel_count(), 0);
}

#[test]
fn deleting_a_panel_returns_every_name_to_the_pool() {
    let mut board = empty_board();
    let panel = board.create_panel("Day", None).unwrap().id;
    place(&mut board, "Alice", Location::slot(panel, 0));
    place(&mut board, "Bob", Location::slot(panel, 12));
    place(&mut board, "Carol", Location::Category(panel));
    board.add_name("Dan").unwrap();
    let pool_before = board.state().pool().len();

    let freed = board.delete_panel(panel).unwrap();

    assert_eq!(freed, vec!["Alice", "Bob", "Carol"]);
    assert_eq!(board.state().pool().len(), pool_before + 3);
    assert!(board.state().panel(panel).is_none());
    assert!(!board.state().grid().has_panel(panel));
    assert!(!board.state().categories().has_category(panel));
    assert!(matches!(
        board.delete_panel(panel),
        Err(BoardError::PanelNotFound(id)) if id == panel
    ));
}

#[test]
fn shrinking_interval_returns_only_cut_slots_to_pool() {
    let mut board = empty_board();
    let panel = board.create_panel("Day", Some(30)).unwrap().id;
    place(&mut board, "Early", Location::slot(panel, 3));
    place(&mut board, "Edge", Location::slot(panel, 23));
    place(&mut board, "Late", Location::slot(panel, 24));
    place(&mut board, "Last", Location::slot(panel, 47));

    let change = board.set_interval(panel, 60).unwrap();

    assert_eq!(change.slot_count, 24);
    assert_eq!(change.displaced, vec!["Late", "Last"]);
    assert_eq!(board.state().grid().get(panel, 3), Some("Early"));
    assert_eq!(board.state().grid().get(panel, 23), Some("Edge"));
    assert_eq!(board.state().locate("Late"), Some(Location::Pool));
    assert_eq!(board.state().locate("Last"), Some(Location::Pool));
}

#[test]
fn too_small_interval_is_clamped() {
    let mut board = empty_board();
    let panel = board.create_panel("Day", None).unwrap().id;

    let change = board.set_interval(panel, 5).unwrap();

    assert_eq!(change.applied_minutes, 10);
    assert_eq!(change.slot_count, 144);
    let notice = change.notice.unwrap();
    assert_eq!(notice.requested, 5);
    assert_eq!(notice.applied, 10);
    assert_eq!(board.state().grid().slot_count(panel), Some(144));
}

#[test]
fn growing_interval_keeps_existing_occupants() {
    let mut board = empty_board();
    let panel = board.create_panel("Day", Some(120)).unwrap().id;
    place(&mut board, "Alice", Location::slot(panel, 11));

    let change = board.set_interval(panel, 15).unwrap();

    assert_eq!(change.slot_count, 96);
    assert!(change.displaced.is_empty());
    assert_eq!(board.state().grid().get(panel, 11), Some("Alice"));
}

#[test]
fn global_interval_applies_to_all_panels_and_new_ones() {
    let mut board = empty_board();
    let first = board.create_panel("One", Some(30)).unwrap().id;
    let second = board.create_panel("Two", Some(15)).unwrap().id;
    place(&mut board, "Alice", Location::slot(second, 90));

    let change = board.set_global_interval(120).unwrap();

    assert_eq!(change.applied_minutes, 120);
    assert_eq!(change.displaced, vec!["Alice"]);
    assert_eq!(board.state().grid().slot_count(first), Some(12));
    assert_eq!(board.state().grid().slot_count(second), Some(12));

    let third = board.create_panel("Three", None).unwrap().id;
    assert_eq!(board.state().panel(third).unwrap().interval_minutes, 120);
}

#[test]
fn rename_enforces_unique_names() {
    let mut board = empty_board();
    let day = board.create_panel("Day", None).unwrap().id;
    board.create_panel("Night", None).unwrap();

    assert!(matches!(
        board.rename_panel(day, "NIGHT"),
        Err(BoardError::NameTaken(_))
    ));
    assert_eq!(
        board.rename_panel(day, " Early ").unwrap(),
        RenameOutcome::Renamed
    );
    assert_eq!(board.state().panel(day).unwrap().display_name, "Early");
    assert!(matches!(
        board.rename_panel(PanelId::new(42), "Late"),
        Err(BoardError::PanelNotFound(_))
    ));
}

#[test]
fn slot_labels_follow_panel_interval() {
    let mut board = empty_board();
    board.create_panel("Day", Some(90)).unwrap();

    let snapshot = board.snapshot();
    let panel = &snapshot.panels[0];
    assert_eq!(panel.container_id, "panel-1");
    assert_eq!(panel.slots.len(), 16);
    assert_eq!(panel.slots[1].label, "01:30");
    assert_eq!(panel.slots[15].label, "22:30");
    assert_eq!(panel.slots[15].container_id, "panel-1-15");
}
