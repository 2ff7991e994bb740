mod common;

use common::{insert_people, people_and_tags, TestDb};
use schema_crud::controller::{ActionForm, Controller, Outcome, REMOVE_OK, SAVE_OK};
use schema_crud::session::SessionState;
use schema_crud::sql::SqlValue;
use schema_crud::view::{ListingView, ViewState};
use std::collections::HashMap;

fn form(pairs: &[(&str, &str)]) -> ActionForm {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect::<HashMap<_, _>>()
        .into()
}

struct Client {
    controller: Controller,
    session: SessionState,
}

impl Client {
    fn new(db: &TestDb) -> Self {
        let state = db.state();
        Client {
            controller: state.controller(),
            session: SessionState::new(state.settings.database_key()),
        }
    }

    async fn post(&mut self, pairs: &[(&str, &str)]) -> Outcome {
        self.controller.dispatch(&mut self.session, &form(pairs)).await
    }

    async fn render(&mut self, page: u32) -> ListingView {
        self.controller.render(&mut self.session, page).await.unwrap()
    }

    async fn tokens(&mut self) -> Vec<String> {
        let view = self.render(0).await;
        view.listing
            .unwrap()
            .rows
            .into_iter()
            .map(|r| r.token.unwrap())
            .collect()
    }
}

fn is_redirect(outcome: &Outcome) -> bool {
    matches!(outcome, Outcome::Redirect)
}

#[tokio::test]
async fn selecting_tables() {
    let db = people_and_tags().await;
    let mut client = Client::new(&db);

    let view = client.render(0).await;
    assert_eq!(view.state, ViewState::NoTableSelected);
    assert_eq!(view.tables, vec!["people", "tags"]);
    assert!(view.listing.is_none());

    assert!(is_redirect(&client.post(&[("action", "list-people")]).await));
    let view = client.render(0).await;
    assert_eq!(view.selected.as_deref(), Some("people"));
    assert_eq!(view.state, ViewState::Listing);
    let listing = view.listing.unwrap();
    assert_eq!(listing.indexed, vec!["name", "name", "created"]);
    assert_eq!(listing.pagination.pages, 1);

    client.post(&[("action", "list-nope")]).await;
    let view = client.render(0).await;
    assert_eq!(view.selected, None);
    assert!(view.message.unwrap().contains("nope"));
    // The message is shown once.
    assert_eq!(client.render(0).await.message, None);
}

#[tokio::test]
async fn remove_by_token_and_stale_tokens() {
    let db = people_and_tags().await;
    insert_people(&db, &["alice", "bob"]).await;
    let mut client = Client::new(&db);
    client.post(&[("action", "list-people")]).await;

    let first = client.tokens().await;
    assert_eq!(first.len(), 2);
    let remove = format!("remove-{}", first[0]);
    client.post(&[("action", remove.as_str())]).await;
    assert_eq!(client.session.message(), Some(REMOVE_OK));
    assert_eq!(db.count("people").await, 1);

    // A re-render replaces every token; the old ones no longer resolve.
    let second = client.tokens().await;
    let stale = format!("remove-{}", first[1]);
    client.post(&[("action", stale.as_str())]).await;
    assert!(client.session.message().unwrap().starts_with("Failed to remove data."));
    assert_eq!(db.count("people").await, 1);
    assert!(!second.contains(&first[1]));
}

#[tokio::test]
async fn remove_of_vanished_row_is_reported() {
    let db = people_and_tags().await;
    insert_people(&db, &["alice"]).await;
    let mut client = Client::new(&db);
    client.post(&[("action", "list-people")]).await;
    let tokens = client.tokens().await;
    db.exec(&["DELETE FROM people"]).await;
    client.post(&[("action", format!("remove-{}", tokens[0]).as_str())]).await;
    assert!(client.session.message().unwrap().starts_with("Failed to remove data."));
}

#[tokio::test]
async fn search_only_on_indexed_columns() {
    let db = people_and_tags().await;
    insert_people(&db, &["alice", "bob", "malik"]).await;
    let mut client = Client::new(&db);
    client.post(&[("action", "list-people")]).await;

    client
        .post(&[("action", "search-add"), ("search-column", "note"), ("search-value", "x")])
        .await;
    assert!(client.session.search().is_empty());
    assert!(client.session.message().is_some());
    client.render(0).await;

    client
        .post(&[("action", "search-add"), ("search-column", "name"), ("search-value", "ali")])
        .await;
    let view = client.render(0).await;
    assert_eq!(view.state, ViewState::Searching);
    let listing = view.listing.unwrap();
    assert_eq!(listing.pagination.total, 2);
    assert_eq!(listing.search[0].column, "name");
    assert_eq!(listing.search[0].pattern, "ali");

    client.post(&[("action", "search-clear")]).await;
    let view = client.render(0).await;
    assert_eq!(view.state, ViewState::Listing);
    assert_eq!(view.listing.unwrap().pagination.total, 3);
}

#[tokio::test]
async fn create_form_then_save() {
    let db = people_and_tags().await;
    let mut client = Client::new(&db);
    client.post(&[("action", "list-people")]).await;

    let Outcome::Form(view) = client.post(&[("action", "create")]).await else {
        panic!("expected a form");
    };
    assert_eq!(view.action_flow, "create");
    assert_eq!(view.fields[0].value, "AUTO_INCREMENT");

    client
        .post(&[
            ("action", "save"),
            ("action-flow", "create"),
            ("_id", "AUTO_INCREMENT"),
            ("_name", "dave"),
            ("_note", "ignored"),
            ("_note-null", "SETNULL"),
            ("_created", "CURRENT_TIMESTAMP"),
        ])
        .await;
    assert_eq!(client.session.message(), Some(SAVE_OK));

    let view = client.render(0).await;
    let row = &view.listing.unwrap().rows[0];
    assert_eq!(row.cells[0], SqlValue::Integer(1));
    assert_eq!(row.cells[1], SqlValue::Text("dave".into()));
    assert_eq!(row.cells[2], SqlValue::Null);
    let created = row.cells[3].display();
    assert!(chrono::NaiveDateTime::parse_from_str(&created, "%Y-%m-%d %H:%M:%S").is_ok());
}

#[tokio::test]
async fn modify_form_then_save() {
    let db = people_and_tags().await;
    insert_people(&db, &["erin"]).await;
    let mut client = Client::new(&db);
    client.post(&[("action", "list-people")]).await;
    let token = client.tokens().await.remove(0);

    let Outcome::Form(view) = client.post(&[("action", format!("modify-{}", token).as_str())]).await else {
        panic!("expected a form");
    };
    assert_eq!(view.fields[1].value, "erin");
    let flow = view.action_flow.clone();

    client
        .post(&[("action", "save"), ("action-flow", flow.as_str()), ("_id", "AUTO_INCREMENT"), ("_name", "erin b")])
        .await;
    assert_eq!(client.session.message(), Some(SAVE_OK));
    let view = client.render(0).await;
    assert_eq!(view.listing.unwrap().rows[0].cells[1], SqlValue::Text("erin b".into()));
}

#[tokio::test]
async fn save_without_flow_changes_nothing() {
    let db = people_and_tags().await;
    let mut client = Client::new(&db);
    client.post(&[("action", "list-people")]).await;
    client.post(&[("action", "save"), ("_name", "frank")]).await;
    assert!(client.session.message().unwrap().starts_with("Failed to save data."));
    client.post(&[("action", "save"), ("action-flow", "upsert"), ("_name", "frank")]).await;
    assert!(client.session.message().unwrap().starts_with("Failed to save data."));
    assert_eq!(db.count("people").await, 0);
}

#[tokio::test]
async fn constraint_failure_is_a_message() {
    let db = people_and_tags().await;
    let mut client = Client::new(&db);
    client.post(&[("action", "list-people")]).await;
    client
        .post(&[("action", "save"), ("action-flow", "create"), ("_name-null", "SETNULL")])
        .await;
    let message = client.session.message().unwrap();
    assert!(message.starts_with("Failed to save data."), "{}", message);
    assert!(message.contains("NOT NULL"), "{}", message);
}

#[tokio::test]
async fn hidden_primary_key_is_left_out_of_listing() {
    let db = people_and_tags().await;
    insert_people(&db, &["gail"]).await;
    let mut settings = db.settings.clone();
    settings.hide_primary_key = true;
    let state = schema_crud::AppState::new(settings);
    let mut client = Client {
        controller: state.controller(),
        session: SessionState::new(state.settings.database_key()),
    };
    client.post(&[("action", "list-people")]).await;
    let listing = client.render(0).await.listing.unwrap();
    assert!(listing.columns.iter().all(|c| c.name != "id"));
    assert_eq!(listing.rows[0].cells.len(), 3);
    assert!(listing.rows[0].token.is_some());
}

#[tokio::test]
async fn composite_keys_get_no_tokens() {
    let db = common::database(&["CREATE TABLE pairs (a INTEGER, b INTEGER, PRIMARY KEY (a, b))"]).await;
    db.exec(&["INSERT INTO pairs VALUES (1, 2)"]).await;
    let mut client = Client::new(&db);
    client.post(&[("action", "list-pairs")]).await;
    let listing = client.render(0).await.listing.unwrap();
    assert_eq!(listing.rows.len(), 1);
    assert_eq!(listing.rows[0].token, None);
}

#[tokio::test]
async fn text_key_is_entered_by_hand() {
    let db = common::database(&["CREATE TABLE codes (code TEXT PRIMARY KEY, autoincrement_step INTEGER)"]).await;
    let mut client = Client::new(&db);
    client.post(&[("action", "list-codes")]).await;

    let Outcome::Form(view) = client.post(&[("action", "create")]).await else {
        panic!("expected a form");
    };
    assert_eq!(view.fields[0].value, "");
    assert!(!view.fields[0].readonly);

    client
        .post(&[("action", "save"), ("action-flow", "create"), ("_code", "A1"), ("_autoincrement_step", "1")])
        .await;
    assert_eq!(client.session.message(), Some(SAVE_OK));
    let listing = client.render(0).await.listing.unwrap();
    assert_eq!(listing.rows[0].cells[0], SqlValue::Text("A1".into()));
    assert!(listing.rows[0].token.is_some());
}
