// src/infrastructure/collection_db.rs
//
// Writes the SQLite collection (`collection.anki2`) embedded in a package.
// Uses the legacy schema 11 layout: models and decks live as JSON in `col`.
use crate::application::ModelRegistry;
use crate::constants::DEFAULT_DECK_ID;
use crate::domain::{Deck, Model, PackageError, SerializationError, Timestamp};
use rusqlite::{params, Connection, Transaction};
use serde_json::{json, Map, Value};
use std::path::Path;
use tracing::{debug, instrument};

pub const COLLECTION_SCHEMA: &str = r#"
CREATE TABLE col (
    id              integer primary key,
    crt             integer not null,
    mod             integer not null,
    scm             integer not null,
    ver             integer not null,
    dty             integer not null,
    usn             integer not null,
    ls              integer not null,
    conf            text not null,
    models          text not null,
    decks           text not null,
    dconf           text not null,
    tags            text not null
);
CREATE TABLE notes (
    id              integer primary key,
    guid            text not null,
    mid             integer not null,
    mod             integer not null,
    usn             integer not null,
    tags            text not null,
    flds            text not null,
    sfld            text not null,
    csum            integer not null,
    flags           integer not null,
    data            text not null
);
CREATE TABLE cards (
    id              integer primary key,
    nid             integer not null,
    did             integer not null,
    ord             integer not null,
    mod             integer not null,
    usn             integer not null,
    type            integer not null,
    queue           integer not null,
    due             integer not null,
    ivl             integer not null,
    factor          integer not null,
    reps            integer not null,
    lapses          integer not null,
    left            integer not null,
    odue            integer not null,
    odid            integer not null,
    flags           integer not null,
    data            text not null
);
CREATE TABLE revlog (
    id              integer primary key,
    cid             integer not null,
    usn             integer not null,
    ease            integer not null,
    ivl             integer not null,
    lastIvl         integer not null,
    factor          integer not null,
    time            integer not null,
    type            integer not null
);
CREATE TABLE graves (
    usn             integer not null,
    oid             integer not null,
    type            integer not null
);
CREATE INDEX ix_notes_usn on notes (usn);
CREATE INDEX ix_cards_usn on cards (usn);
CREATE INDEX ix_revlog_usn on revlog (usn);
CREATE INDEX ix_cards_nid on cards (nid);
CREATE INDEX ix_cards_sched on cards (did, queue, due);
CREATE INDEX ix_revlog_cid on revlog (cid);
CREATE INDEX ix_notes_csum on notes (csum);
"#;

/// Collection creation day Anki uses as scheduling epoch.
const COLLECTION_CREATED: i64 = 1_411_124_400;
const SCHEMA_VERSION: i64 = 11;

/// Hands out note and card ids from one counter.
struct IdSequence(i64);

impl IdSequence {
    fn next(&mut self) -> Result<i64, PackageError> {
        let id = self.0;
        self.0 = id
            .checked_add(1)
            .ok_or(SerializationError::IdOverflow { last: id })?;
        Ok(id)
    }
}

/// Write models, decks, notes and cards to a new database at `path`.
#[instrument(level = "debug", skip(registry, decks), fields(decks = decks.len()))]
pub fn write_collection(
    path: &Path,
    registry: &ModelRegistry,
    decks: &[Deck],
    timestamp: Timestamp,
) -> Result<(), PackageError> {
    let mut conn = Connection::open(path)?;
    conn.execute_batch(COLLECTION_SCHEMA)?;

    let tx = conn.transaction()?;
    insert_col(&tx, registry, decks, timestamp)?;
    let (notes, cards) = insert_notes_and_cards(&tx, registry, decks, timestamp)?;
    tx.commit()?;

    conn.close().map_err(|(_, e)| e)?;
    debug!(notes, cards, "Wrote collection database");
    Ok(())
}

fn insert_col(
    tx: &Transaction<'_>,
    registry: &ModelRegistry,
    decks: &[Deck],
    timestamp: Timestamp,
) -> Result<(), PackageError> {
    let conf = json!({
        "activeDecks": [DEFAULT_DECK_ID],
        "curDeck": DEFAULT_DECK_ID,
        "newSpread": 0,
        "collapseTime": 1200,
        "timeLim": 0,
        "estTimes": true,
        "dueCounts": true,
        "curModel": null,
        "nextPos": 1,
        "sortType": "noteFld",
        "sortBackwards": false,
        "addToCur": true,
    });

    let mut models = Map::new();
    for model in registry.iter() {
        let home_deck = decks
            .iter()
            .find(|d| d.notes.iter().any(|n| n.model_id == model.id()))
            .map_or(DEFAULT_DECK_ID, |d| d.id);
        models.insert(model.id().to_string(), model_json(model, home_deck, timestamp));
    }

    let mut deck_map = Map::new();
    deck_map.insert(
        DEFAULT_DECK_ID.to_string(),
        deck_json(DEFAULT_DECK_ID, "Default", "", timestamp),
    );
    for deck in decks {
        deck_map.insert(
            deck.id.to_string(),
            deck_json(deck.id, &deck.name, &deck.description, timestamp),
        );
    }

    tx.execute(
        "INSERT INTO col VALUES (1, ?1, ?2, ?3, ?4, 0, 0, 0, ?5, ?6, ?7, ?8, '{}')",
        params![
            COLLECTION_CREATED,
            timestamp.as_millis(),
            timestamp.as_millis(),
            SCHEMA_VERSION,
            serde_json::to_string(&conf)?,
            serde_json::to_string(&Value::Object(models))?,
            serde_json::to_string(&Value::Object(deck_map))?,
            serde_json::to_string(&deck_config_json())?,
        ],
    )?;
    Ok(())
}

fn insert_notes_and_cards(
    tx: &Transaction<'_>,
    registry: &ModelRegistry,
    decks: &[Deck],
    timestamp: Timestamp,
) -> Result<(usize, usize), PackageError> {
    let mut ids = IdSequence(timestamp.as_millis());
    let mut note_stmt = tx.prepare(
        "INSERT INTO notes VALUES (?1, ?2, ?3, ?4, -1, ?5, ?6, ?7, 0, 0, '')",
    )?;
    let mut card_stmt = tx.prepare(
        "INSERT INTO cards VALUES (?1, ?2, ?3, ?4, ?5, -1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, '')",
    )?;

    let (mut note_count, mut card_count) = (0, 0);
    for deck in decks {
        for note in &deck.notes {
            let model = registry.get(note.model_id).ok_or(
                PackageError::UnresolvedModelReference {
                    deck_id: deck.id,
                    model_id: note.model_id,
                },
            )?;

            let note_id = ids.next()?;
            note_stmt.execute(params![
                note_id,
                note.guid,
                note.model_id,
                timestamp.as_secs(),
                note.formatted_tags(),
                note.formatted_fields(),
                note.sort_field,
            ])?;
            note_count += 1;

            for ord in model.card_ords(&note.fields) {
                card_stmt.execute(params![
                    ids.next()?,
                    note_id,
                    deck.id,
                    ord as i64,
                    timestamp.as_secs(),
                ])?;
                card_count += 1;
            }
        }
    }

    Ok((note_count, card_count))
}

fn model_json(model: &Model, deck_id: i64, timestamp: Timestamp) -> Value {
    let fields: Vec<Value> = model
        .fields()
        .iter()
        .enumerate()
        .map(|(ord, f)| {
            json!({
                "name": f.name,
                "ord": ord,
                "font": f.font,
                "media": [],
                "rtl": f.rtl,
                "size": f.size,
                "sticky": f.sticky,
            })
        })
        .collect();

    let templates: Vec<Value> = model
        .templates()
        .iter()
        .enumerate()
        .map(|(ord, t)| {
            json!({
                "name": t.name,
                "ord": ord,
                "qfmt": t.qfmt,
                "afmt": t.afmt,
                "bqfmt": t.bqfmt,
                "bafmt": t.bafmt,
                "bfont": t.bfont,
                "bsize": t.bsize,
                "did": null,
            })
        })
        .collect();

    let req: Vec<Value> = model
        .requirements()
        .into_iter()
        .map(|r| {
            let rule = if r.field_ords.is_empty() { "none" } else { "any" };
            json!([r.ord, rule, r.field_ords])
        })
        .collect();

    json!({
        "id": model.id(),
        "name": model.name(),
        "type": i64::from(model.kind()),
        "mod": timestamp.as_secs(),
        "usn": -1,
        "sortf": model.sort_field_index(),
        "did": deck_id,
        "tmpls": templates,
        "flds": fields,
        "css": model.css(),
        "latexPre": model.latex_pre(),
        "latexPost": model.latex_post(),
        "latexsvg": false,
        "req": req,
        "tags": [],
        "vers": [],
    })
}

fn deck_json(id: i64, name: &str, description: &str, timestamp: Timestamp) -> Value {
    json!({
        "id": id,
        "name": name,
        "desc": description,
        "mod": timestamp.as_secs(),
        "usn": -1,
        "collapsed": false,
        "conf": 1,
        "dyn": 0,
        "extendNew": 10,
        "extendRev": 50,
        "lrnToday": [0, 0],
        "newToday": [0, 0],
        "revToday": [0, 0],
        "timeToday": [0, 0],
    })
}

fn deck_config_json() -> Value {
    json!({
        "1": {
            "id": 1,
            "name": "Default",
            "mod": 0,
            "usn": 0,
            "autoplay": true,
            "maxTaken": 60,
            "replayq": true,
            "timer": 0,
            "lapse": {
                "delays": [10],
                "leechAction": 0,
                "leechFails": 8,
                "minInt": 1,
                "mult": 0,
            },
            "new": {
                "bury": true,
                "delays": [1, 10],
                "initialFactor": 2500,
                "ints": [1, 4, 7],
                "order": 1,
                "perDay": 20,
                "separate": true,
            },
            "rev": {
                "bury": true,
                "ease4": 1.3,
                "fuzz": 0.05,
                "ivlFct": 1,
                "maxIvl": 36500,
                "minSpace": 1,
                "perDay": 100,
            },
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{DeckAssembler, DeckSpec, ModelSpec};
    use serde_json::json;
    use tempfile::TempDir;

    fn fixture() -> (ModelRegistry, Vec<Deck>) {
        let models: Vec<ModelSpec> = serde_json::from_value(json!([
            {
                "id": 1,
                "name": "Basic (and reversed)",
                "fields": [{"name": "Front"}, {"name": "Back"}],
                "templates": [
                    {"name": "Card 1", "qfmt": "{{Front}}", "afmt": "{{Back}}"},
                    {"name": "Card 2", "qfmt": "{{Back}}", "afmt": "{{Front}}"}
                ]
            },
            {
                "id": 2,
                "name": "Unused",
                "fields": [{"name": "Only"}],
                "templates": [{"name": "T", "qfmt": "{{Only}}", "afmt": ""}]
            }
        ]))
        .unwrap();
        let decks: Vec<DeckSpec> = serde_json::from_value(json!([
            {"id": 100, "name": "Geo", "description": "Capitals", "notes": [
                {"model": 1, "fields": ["France", "Paris"], "tags": ["europe"]}
            ]}
        ]))
        .unwrap();

        let registry = ModelRegistry::build(&models).unwrap();
        let decks = DeckAssembler::new(&registry).assemble(&decks).unwrap();
        (registry, decks)
    }

    #[test]
    fn given_decks_when_writing_then_inserts_note_and_card_per_template() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("collection.anki2");
        let (registry, decks) = fixture();
        let timestamp = Timestamp::from_secs_f64(1_700_000_000.5).unwrap();

        write_collection(&path, &registry, &decks, timestamp).unwrap();

        let conn = Connection::open(&path).unwrap();
        let (id, guid, flds, tags, sfld): (i64, String, String, String, String) = conn
            .query_row("SELECT id, guid, flds, tags, sfld FROM notes", [], |r| {
                Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
            })
            .unwrap();
        assert_eq!(id, 1_700_000_000_500);
        assert_eq!(guid, crate::domain::guid_for(&["France", "Paris"]));
        assert_eq!(flds, "France\u{1f}Paris");
        assert_eq!(tags, " europe ");
        assert_eq!(sfld, "France");

        let cards: Vec<(i64, i64, i64, i64)> = conn
            .prepare("SELECT id, nid, did, ord FROM cards ORDER BY ord")
            .unwrap()
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            cards,
            vec![
                (1_700_000_000_501, id, 100, 0),
                (1_700_000_000_502, id, 100, 1)
            ]
        );
    }

    #[test]
    fn given_registry_when_writing_then_col_holds_models_and_decks_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("collection.anki2");
        let (registry, decks) = fixture();
        let timestamp = Timestamp::from_secs_f64(1_700_000_000.0).unwrap();

        write_collection(&path, &registry, &decks, timestamp).unwrap();

        let conn = Connection::open(&path).unwrap();
        let (models, deck_json): (String, String) = conn
            .query_row("SELECT models, decks FROM col", [], |r| Ok((r.get(0)?, r.get(1)?)))
            .unwrap();
        let models: Value = serde_json::from_str(&models).unwrap();
        let deck_json: Value = serde_json::from_str(&deck_json).unwrap();

        assert_eq!(models["1"]["did"], 100);
        assert_eq!(models["2"]["did"], DEFAULT_DECK_ID);
        assert_eq!(models["1"]["tmpls"][1]["ord"], 1);
        assert_eq!(models["1"]["req"], json!([[0, "any", [0]], [1, "any", [1]]]));
        assert_eq!(models["1"]["mod"], 1_700_000_000);
        assert_eq!(deck_json["100"]["name"], "Geo");
        assert_eq!(deck_json["100"]["desc"], "Capitals");
        assert_eq!(deck_json["1"]["name"], "Default");
    }

    #[test]
    fn given_note_with_unregistered_model_when_writing_then_fails_instead_of_dropping() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("collection.anki2");
        let (_, decks) = fixture();
        let empty = ModelRegistry::default();
        let timestamp = Timestamp::from_secs_f64(1_700_000_000.0).unwrap();

        let err = write_collection(&path, &empty, &decks, timestamp).unwrap_err();

        assert!(matches!(
            err,
            PackageError::UnresolvedModelReference {
                deck_id: 100,
                model_id: 1
            }
        ));
    }

    #[test]
    fn given_exhausted_id_space_when_drawing_ids_then_reports_overflow() {
        let mut ids = IdSequence(i64::MAX - 1);

        assert_eq!(ids.next().unwrap(), i64::MAX - 1);
        assert!(matches!(
            ids.next(),
            Err(PackageError::Serialization(SerializationError::IdOverflow { .. }))
        ));
    }
}
