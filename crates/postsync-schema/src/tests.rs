use super::*;

struct Widget;

impl Entity for Widget {
    const TABLE: &'static str = "widgets";

    fn table() -> Table {
        Table {
            name: Self::TABLE.to_string(),
            columns: vec![
                Column::identity_pk("id", PgType::BigInt),
                Column::new("label", PgType::Text).default("''"),
                Column::new("retired_at", PgType::Timestamptz).nullable(),
            ],
            indices: vec![Index::on(Self::TABLE, &["retired_at"])],
        }
    }
}

inventory::submit!(TableDef::new::<Widget>());

#[test]
fn test_quote_ident() {
    assert_eq!(quote_ident("posts"), "\"posts\"");
    assert_eq!(quote_ident("user"), "\"user\"");
    assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
}

#[test]
fn test_index_name() {
    assert_eq!(index_name("posts", &["deleted_at"]), "idx_posts_deleted_at");
    assert_eq!(index_name("posts", &["title", "body"]), "idx_posts_title_body");
}

#[test]
fn test_pg_type_from_information_schema() {
    assert_eq!(PgType::from_information_schema("bigint"), PgType::BigInt);
    assert_eq!(
        PgType::from_information_schema("timestamp with time zone"),
        PgType::Timestamptz
    );
    assert_eq!(
        PgType::from_information_schema("timestamp without time zone"),
        PgType::Timestamp
    );
    assert_eq!(PgType::from_information_schema("text"), PgType::Text);
    assert_eq!(
        PgType::from_information_schema("ARRAY"),
        PgType::Other("ARRAY".to_string())
    );
    assert_eq!(
        PgType::from_information_schema("USER-DEFINED"),
        PgType::Other("USER-DEFINED".to_string())
    );
}

#[test]
fn test_pg_type_display() {
    assert_eq!(PgType::BigInt.to_string(), "BIGINT");
    assert_eq!(PgType::Timestamptz.to_string(), "TIMESTAMPTZ");
    assert_eq!(PgType::DoublePrecision.to_string(), "DOUBLE PRECISION");
    assert_eq!(PgType::Other("inet".to_string()).to_string(), "inet");
}

#[test]
fn test_column_builders() {
    let id = Column::identity_pk("id", PgType::BigInt);
    assert!(id.primary_key);
    assert!(id.identity);
    assert!(!id.nullable);

    let deleted_at = Column::new("deleted_at", PgType::Timestamptz).nullable();
    assert!(deleted_at.nullable);
    assert!(deleted_at.default.is_none());

    let title = Column::new("title", PgType::Text).default("''");
    assert_eq!(title.default.as_deref(), Some("''"));
    assert!(!title.nullable);
}

#[test]
fn test_table_primary_key() {
    let table = Widget::table();
    assert_eq!(table.primary_key(), vec!["id"]);
    assert!(table.column("label").is_some());
    assert!(table.column("missing").is_none());
}

#[test]
fn test_schema_collect_finds_registered_entity() {
    let schema = Schema::collect();
    let widgets = schema
        .get_table("widgets")
        .expect("widgets should be registered");
    assert_eq!(widgets.columns.len(), 3);
    assert_eq!(widgets.indices[0].name, "idx_widgets_retired_at");
}

#[test]
fn test_table_def_name() {
    let def = TableDef::new::<Widget>();
    assert_eq!(def.table_name(), "widgets");
    assert_eq!(def.to_table(), Widget::table());
}
