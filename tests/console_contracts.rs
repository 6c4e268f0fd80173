//! End-to-end command contracts: both grammars, validation ordering, and the
//! interpreter scenarios, driven through normalize + dispatch exactly as the
//! REPL drives them.

use std::fs;
use std::thread::sleep;
use std::time::Duration;

use kardex::console::dispatch::{dispatch, Flow, Reply};
use kardex::console::normalize::normalize;
use kardex::core::error::KardexError;
use kardex::core::model::ModelKind;
use kardex::core::store::FileStore;
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};

fn shell(store: &mut FileStore, line: &str) -> Result<Reply, KardexError> {
    dispatch(store, normalize(line)?)
}

/// Runs a line that must succeed and returns its printed lines.
fn ok(store: &mut FileStore, line: &str) -> Vec<String> {
    shell(store, line).unwrap_or_else(|e| panic!("`{line}` failed: {e}")).lines
}

/// Runs a line that must fail and returns its diagnostic.
fn diag(store: &mut FileStore, line: &str) -> String {
    shell(store, line)
        .err()
        .unwrap_or_else(|| panic!("`{line}` unexpectedly succeeded"))
        .to_string()
}

fn open_store(tmp: &TempDir) -> FileStore {
    FileStore::open(tmp.path().join("file_storage.json")).unwrap()
}

#[test]
fn scenario_create_then_count() {
    let tmp = tempdir().unwrap();
    let mut store = open_store(&tmp);
    let lines = ok(&mut store, "create State");
    assert_eq!(lines.len(), 1);
    assert!(!lines[0].is_empty());
    assert_eq!(ok(&mut store, "count State"), vec!["1"]);
}

#[test]
fn scenario_show_never_created() {
    let tmp = tempdir().unwrap();
    let mut store = open_store(&tmp);
    assert_eq!(
        diag(
            &mut store,
            "show BaseModel 00000000-0000-0000-0000-000000000000"
        ),
        "** no instance found **"
    );
}

#[test]
fn scenario_update_advances_clock_and_shows() {
    let tmp = tempdir().unwrap();
    let mut store = open_store(&tmp);
    let id = ok(&mut store, "create User").remove(0);

    let key = format!("User.{id}");
    let after_create = store.get(&key).unwrap().updated_at();

    sleep(Duration::from_millis(2));
    let reply = ok(&mut store, &format!("update User {id} first_name \"Betty\""));
    assert!(reply.is_empty(), "update prints nothing on success");

    let shown = ok(&mut store, &format!("show User {id}")).remove(0);
    assert!(shown.contains("\"first_name\":\"Betty\""));
    assert!(store.get(&key).unwrap().updated_at() > after_create);
}

#[test]
fn scenario_destroy_then_destroy_again() {
    let tmp = tempdir().unwrap();
    let mut store = open_store(&tmp);
    let id = ok(&mut store, "create Amenity").remove(0);
    let key = format!("Amenity.{id}");

    assert!(ok(&mut store, &format!("destroy Amenity {id}")).is_empty());
    let document: Value =
        serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
    assert!(document.get(&key).is_none(), "file still lists {key}");

    assert_eq!(
        diag(&mut store, &format!("destroy Amenity {id}")),
        "** no instance found **"
    );
}

#[test]
fn scenario_reload_handwritten_record() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("file_storage.json");
    fs::write(
        &path,
        json!({
            "User.abc": {
                "email": "e@x.io",
                "password": "",
                "first_name": "Grace",
                "last_name": "",
                "id": "abc",
                "created_at": "2024-01-01T00:00:00.000000",
                "updated_at": "2024-01-01T00:00:00.000000",
                "__class__": "User"
            }
        })
        .to_string(),
    )
    .unwrap();

    let mut store = FileStore::open(&path).unwrap();
    assert_eq!(store.count(ModelKind::User), 1);
    let shown = ok(&mut store, "show User abc").remove(0);
    assert!(shown.starts_with("[User] (abc) "));
    assert!(shown.contains("\"first_name\":\"Grace\""));
}

#[test]
fn dual_syntax_create_is_equivalent() {
    let tmp = tempdir().unwrap();
    let mut store = open_store(&tmp);

    let id1 = ok(&mut store, "create User").remove(0);
    assert_eq!(ok(&mut store, "count User"), vec!["1"]);

    let id2 = ok(&mut store, "User.create()").remove(0);
    assert_eq!(ok(&mut store, "User.count()"), vec!["2"]);

    assert_ne!(id1, id2, "each create prints a fresh unique id");
}

#[test]
fn dual_syntax_update_is_equivalent() {
    let tmp = tempdir().unwrap();
    let mut store = open_store(&tmp);
    let first_name = |store: &FileStore, id: &str| {
        store.get(&format!("User.{id}")).unwrap().attributes()["first_name"].clone()
    };

    let id = ok(&mut store, "create User").remove(0);

    ok(&mut store, &format!("update User {id} first_name Betty"));
    assert_eq!(first_name(&store, &id), json!("Betty"));

    ok(&mut store, &format!("update User {id} first_name Other"));
    ok(&mut store, &format!("User.update({id}, first_name, Betty)"));
    assert_eq!(first_name(&store, &id), json!("Betty"));

    ok(&mut store, &format!("update User {id} first_name Other"));
    ok(
        &mut store,
        &format!("User.update({id}, {{\"first_name\": \"Betty\"}})"),
    );
    assert_eq!(first_name(&store, &id), json!("Betty"));
}

#[test]
fn bulk_update_applies_every_pair() {
    let tmp = tempdir().unwrap();
    let mut store = open_store(&tmp);
    let id = ok(&mut store, "create Place").remove(0);

    ok(
        &mut store,
        &format!("Place.update({id}, {{\"name\": \"Loft\", \"max_guest\": 4, \"latitude\": 43.7}})"),
    );
    let place = store.get(&format!("Place.{id}")).unwrap();
    assert_eq!(place.attributes()["name"], json!("Loft"));
    assert_eq!(place.attributes()["max_guest"], json!(4));
    assert_eq!(place.attributes()["latitude"], json!(43.7));
}

#[test]
fn update_coerces_bare_literals_and_keeps_quoted_strings() {
    let tmp = tempdir().unwrap();
    let mut store = open_store(&tmp);
    let id = ok(&mut store, "create Place").remove(0);

    ok(&mut store, &format!("update Place {id} max_guest 6"));
    ok(&mut store, &format!("update Place {id} description \"6\""));
    let place = store.get(&format!("Place.{id}")).unwrap();
    assert_eq!(place.attributes()["max_guest"], json!(6));
    assert_eq!(place.attributes()["description"], json!("6"));
}

#[test]
fn list_literal_in_update_payload_is_dropped() {
    let tmp = tempdir().unwrap();
    let mut store = open_store(&tmp);
    let id = ok(&mut store, "create Place").remove(0);

    // The list content is excised before tokenizing, so it never reaches the
    // entity: with nothing after it, the value slot is simply empty.
    assert_eq!(
        diag(
            &mut store,
            &format!("Place.update({id}, \"amenity_ids\", [\"a1\", \"a2\"])"),
        ),
        "** value missing **"
    );
    let place = store.get(&format!("Place.{id}")).unwrap();
    assert_eq!(place.attributes()["amenity_ids"], json!([]));

    // A scalar after the excised list takes the value slot instead.
    ok(
        &mut store,
        &format!("Place.update({id}, \"max_guest\", [1, 2], 9)"),
    );
    let place = store.get(&format!("Place.{id}")).unwrap();
    assert_eq!(place.attributes()["max_guest"], json!(9));
}

#[test]
fn quoted_values_with_separators_survive_call_style() {
    let tmp = tempdir().unwrap();
    let mut store = open_store(&tmp);
    let id = ok(&mut store, "create User").remove(0);

    // Commas and brackets inside a quoted value are text, not payload
    // structure.
    ok(&mut store, &format!("User.update({id}, bio, \"a, b\")"));
    ok(
        &mut store,
        &format!("User.update({id}, note, \"see [1] below\")"),
    );
    let user = store.get(&format!("User.{id}")).unwrap();
    assert_eq!(user.attributes()["bio"], json!("a, b"));
    assert_eq!(user.attributes()["note"], json!("see [1] below"));
}

#[test]
fn extra_positional_arguments_are_ignored() {
    let tmp = tempdir().unwrap();
    let mut store = open_store(&tmp);
    let id = ok(&mut store, "create User").remove(0);

    ok(
        &mut store,
        &format!("update User {id} first_name Betty last_name Ignored"),
    );
    let user = store.get(&format!("User.{id}")).unwrap();
    assert_eq!(user.attributes()["first_name"], json!("Betty"));
    assert_eq!(user.attributes()["last_name"], json!(""));
}

#[test]
fn validation_ordering_for_update() {
    let tmp = tempdir().unwrap();
    let mut store = open_store(&tmp);
    assert_eq!(diag(&mut store, "update"), "** class name missing **");
    assert_eq!(diag(&mut store, "update User"), "** instance id missing **");
    assert_eq!(
        diag(&mut store, "update User some-id"),
        "** attribute name missing **"
    );
    assert_eq!(
        diag(&mut store, "update User some-id first_name"),
        "** value missing **"
    );
}

#[test]
fn unknown_type_diagnostic_is_uniform() {
    let tmp = tempdir().unwrap();
    let mut store = open_store(&tmp);
    let lines = [
        "create Wizard",
        "show Wizard 1",
        "destroy Wizard 1",
        "update Wizard 1 name x",
        "all Wizard",
        "count Wizard",
        "Wizard.all()",
        "Wizard.count()",
        "Wizard.show(1)",
    ];
    for line in lines {
        assert_eq!(diag(&mut store, line), "** class doesn't exist **", "{line}");
    }
}

#[test]
fn all_lists_and_filters() {
    let tmp = tempdir().unwrap();
    let mut store = open_store(&tmp);
    ok(&mut store, "create User");
    ok(&mut store, "create User");
    ok(&mut store, "create State");

    assert_eq!(ok(&mut store, "all").len(), 3);
    let users = ok(&mut store, "all User");
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|line| line.starts_with("[User]")));
    assert_eq!(ok(&mut store, "State.all()").len(), 1);
}

#[test]
fn all_with_no_entities_prints_nothing() {
    let tmp = tempdir().unwrap();
    let mut store = open_store(&tmp);
    assert!(ok(&mut store, "all").is_empty());
    assert!(ok(&mut store, "all User").is_empty());
}

#[test]
fn quit_and_eof_flow() {
    let tmp = tempdir().unwrap();
    let mut store = open_store(&tmp);
    assert_eq!(shell(&mut store, "quit").unwrap().flow, Flow::Stopped);
    let reply = shell(&mut store, "eof").unwrap();
    assert_eq!(reply.flow, Flow::Stopped);
    assert_eq!(reply.lines, vec![String::new()]);
    // Ordinary verbs keep running.
    assert_eq!(shell(&mut store, "all").unwrap().flow, Flow::Running);
}

#[test]
fn create_persists_immediately() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("file_storage.json");
    let id = {
        let mut store = FileStore::open(&path).unwrap();
        ok(&mut store, "create Review").remove(0)
    };
    // A second process (fresh store over the same file) sees the record.
    let store = FileStore::open(&path).unwrap();
    assert!(store.get(&format!("Review.{id}")).is_some());
}

#[test]
fn update_through_both_syntaxes_persists() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("file_storage.json");
    let mut store = FileStore::open(&path).unwrap();
    let id = ok(&mut store, "create City").remove(0);
    ok(&mut store, &format!("City.update({id}, name, \"Nairobi\")"));

    let reopened = FileStore::open(&path).unwrap();
    assert_eq!(
        reopened.get(&format!("City.{id}")).unwrap().attributes()["name"],
        json!("Nairobi")
    );
}
