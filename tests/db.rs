use merlin_panel::db::{ConnectionError, DatabaseGateway, DieselGateway, get_connection};

#[test]
fn gateway_connects_to_reachable_database() {
    let dir = tempfile::tempdir().unwrap();
    let url = dir.path().join("panel.db").display().to_string();

    let pool = DieselGateway.connect(&url).unwrap();

    assert!(get_connection(&pool).is_ok());
    assert!(dir.path().join("panel.db").exists());
}

#[test]
fn gateway_reports_unreachable_database() {
    let dir = tempfile::tempdir().unwrap();
    let url = dir
        .path()
        .join("missing")
        .join("panel.db")
        .display()
        .to_string();

    let err = DieselGateway.connect(&url).err().unwrap();

    assert!(matches!(err, ConnectionError::Unreachable(_)));
    assert!(err.to_string().starts_with("Could not connect to database"));
}
