mod common;

use anyhow::Result;

use common::{row, str_row};
use thunder_core::{Db, Error, JsonCodec, Row, Schema, Selector};
use thunder_ql::{Op, Value};

#[test]
fn insert_select_delete_round_trip() -> Result<()> {
    let db = Db::memory()?;
    let tx = db.begin(true)?;
    {
        let mut users =
            tx.create_relation("users", Schema::new(["id", "username", "role"]).index("username"))?;
        users.insert(&str_row(&[("id", "1"), ("username", "alice"), ("role", "admin")]))?;

        let found: Vec<Row> = users.select(&[Op::eq("username", "alice")])?.collect::<Result<_, Error>>()?;
        assert_eq!(found, vec![str_row(&[("id", "1"), ("username", "alice"), ("role", "admin")])]);

        assert_eq!(users.delete(&[Op::eq("id", "1")])?, 1);
        assert!(users.select(&[Op::eq("username", "alice")])?.next().is_none());
        // The delete restored the pre-insert state: nothing matches anywhere.
        assert!(users.select(&[])?.next().is_none());
    }
    tx.commit()?;
    Ok(())
}

#[test]
fn unique_violation_rejects_second_insert() -> Result<()> {
    let db = Db::memory()?;

    let tx = db.begin(true)?;
    {
        let mut accounts = tx.create_relation("accounts", Schema::new(["id", "email"]).unique("email"))?;
        accounts.insert(&str_row(&[("id", "1"), ("email", "a@x")]))?;
    }
    tx.commit()?;

    let tx = db.begin(true)?;
    {
        let mut accounts = tx.relation("accounts")?;
        let err = accounts.insert(&str_row(&[("id", "2"), ("email", "a@x")])).unwrap_err();
        assert!(matches!(err, Error::UniqueConstraint(index) if index == "email"));
    }
    tx.rollback()?;

    let tx = db.begin(false)?;
    {
        let accounts = tx.relation("accounts")?;
        let rows: Vec<Row> = accounts.select(&[])?.collect::<Result<_, Error>>()?;
        assert_eq!(rows, vec![str_row(&[("id", "1"), ("email", "a@x")])]);
    }
    tx.commit()?;
    Ok(())
}

#[test]
fn schema_violations_surface_before_any_write() -> Result<()> {
    let db = Db::memory()?;
    let tx = db.begin(true)?;
    {
        let mut users = tx.create_relation("users", Schema::new(["id", "name"]))?;

        let err = users.insert(&str_row(&[("id", "1")])).unwrap_err();
        assert!(matches!(err, Error::FieldCountMismatch { expected: 2, actual: 1 }));

        let err = users.insert(&str_row(&[("id", "1"), ("nickname", "al")])).unwrap_err();
        assert!(matches!(err, Error::MissingField(field) if field == "name"));

        assert!(users.select(&[])?.next().is_none());
    }
    tx.rollback()?;
    Ok(())
}

#[test]
fn rollback_discards_all_three_stores() -> Result<()> {
    let db = Db::memory()?;

    let tx = db.begin(true)?;
    {
        let mut users = tx.create_relation("users", Schema::new(["id", "name"]).index("name"))?;
        users.insert(&str_row(&[("id", "1"), ("name", "alice")]))?;
    }
    tx.commit()?;

    let tx = db.begin(true)?;
    {
        let mut users = tx.relation("users")?;
        users.insert(&str_row(&[("id", "2"), ("name", "bob")]))?;
    }
    tx.rollback()?;

    let tx = db.begin(false)?;
    {
        let users = tx.relation("users")?;
        let rows: Vec<Row> = users.select(&[])?.collect::<Result<_, Error>>()?;
        assert_eq!(rows.len(), 1);
        assert!(users.select(&[Op::eq("name", "bob")])?.next().is_none());
    }
    tx.commit()?;
    Ok(())
}

#[test]
fn committed_rows_survive_reopen() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("thunder.redb");

    {
        let db = Db::open(&path)?;
        let tx = db.begin(true)?;
        {
            let mut events = tx.create_relation("events", Schema::new(["ts", "payload"]).index("ts"))?;
            events.insert(&row(&[("ts", Value::I64(10)), ("payload", Value::from("boot"))]))?;
        }
        tx.commit()?;
    }

    let db = Db::open(&path)?;
    let tx = db.begin(false)?;
    {
        let events = tx.relation("events")?;
        let rows: Vec<Row> = events.select(&[Op::eq("ts", 10i64)])?.collect::<Result<_, Error>>()?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["payload"], Value::from("boot"));
    }
    tx.commit()?;
    Ok(())
}

#[test]
fn row_ids_are_never_reused() -> Result<()> {
    let db = Db::memory()?;

    let tx = db.begin(true)?;
    {
        let mut log = tx.create_relation("log", Schema::new(["n"]))?;
        log.insert(&row(&[("n", Value::I64(1))]))?;
        log.insert(&row(&[("n", Value::I64(2))]))?;
        assert_eq!(log.delete(&[Op::eq("n", 2i64)])?, 1);
        log.insert(&row(&[("n", Value::I64(3))]))?;

        // Full scans run in row-id order; a reused id would break it.
        let rows: Vec<Row> = log.select(&[])?.collect::<Result<_, Error>>()?;
        assert_eq!(rows, vec![row(&[("n", Value::I64(1))]), row(&[("n", Value::I64(3))])]);
    }
    tx.commit()?;
    Ok(())
}

#[test]
fn alternate_row_codecs_round_trip() -> Result<()> {
    let db = Db::options().row_codec(JsonCodec).memory()?;
    let tx = db.begin(true)?;
    {
        let mut users = tx.create_relation("users", Schema::new(["id", "score"]))?;
        users.insert(&row(&[("id", Value::from("1")), ("score", Value::F64(0.5))]))?;
        let rows: Vec<Row> = users.select(&[])?.collect::<Result<_, Error>>()?;
        assert_eq!(rows[0]["score"], Value::F64(0.5));
    }
    tx.commit()?;
    Ok(())
}

#[test]
fn relation_management() -> Result<()> {
    let db = Db::memory()?;
    let tx = db.begin(true)?;
    {
        tx.create_relation("users", Schema::new(["id"]))?;
        tx.create_relation("events", Schema::new(["ts"]).index("ts"))?;
    }
    assert_eq!(tx.relation_names()?, ["events", "users"]);

    let err = tx.create_relation("users", Schema::new(["id"])).unwrap_err();
    assert!(matches!(err, Error::RelationExists(name) if name == "users"));

    let err = tx.relation("ghosts").unwrap_err();
    assert!(matches!(err, Error::RelationNotFound(name) if name == "ghosts"));

    assert!(tx.drop_relation("events")?);
    assert!(!tx.drop_relation("events")?);
    assert_eq!(tx.relation_names()?, ["users"]);
    tx.commit()?;

    let tx = db.begin(false)?;
    let err = tx.create_relation("more", Schema::new(["id"])).unwrap_err();
    assert!(matches!(err, Error::ReadOnlyTransaction));
    tx.commit()?;
    Ok(())
}

#[test]
fn projection_is_transparent_and_composes() -> Result<()> {
    let db = Db::memory()?;
    let tx = db.begin(true)?;
    {
        let mut users = tx.create_relation("users", Schema::new(["id", "username"]).index("username"))?;
        users.insert(&str_row(&[("id", "1"), ("username", "alice")]))?;
        users.insert(&str_row(&[("id", "2"), ("username", "bob")]))?;

        // Identity projection behaves exactly like the relation.
        let identity = users.project(&[]);
        let direct: Vec<Row> = users.select(&[Op::eq("username", "alice")])?.collect::<Result<_, Error>>()?;
        let projected: Vec<Row> =
            identity.select(&[Op::eq("username", "alice")])?.collect::<Result<_, Error>>()?;
        assert_eq!(direct, projected);

        // Renaming translates predicates inbound and rows outbound.
        let renamed = users.project(&[("username", "login")]);
        assert_eq!(renamed.columns(), ["id", "login"]);
        let rows: Vec<Row> = renamed.select(&[Op::eq("login", "bob")])?.collect::<Result<_, Error>>()?;
        assert_eq!(rows, vec![str_row(&[("id", "2"), ("login", "bob")])]);

        // Projections compose.
        let twice = renamed.project(&[("login", "handle")]);
        let rows: Vec<Row> = twice.select(&[Op::eq("handle", "bob")])?.collect::<Result<_, Error>>()?;
        assert_eq!(rows, vec![str_row(&[("id", "2"), ("handle", "bob")])]);
    }
    tx.rollback()?;
    Ok(())
}
