//! Property tests for filtering and rendering

use dbv::config::OutputFormat;
use dbv::driver::Backend;
use dbv::filter::{FilterPolicy, should_include};
use dbv::render::render;
use dbv::schema::{Column, ForeignKey, Schema, Table};
use proptest::prelude::*;

fn name() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9_]{0,8}"
}

fn column() -> impl Strategy<Value = Column> {
    (
        name(),
        prop::sample::select(vec!["int", "varchar", "text", "numeric", "bool", "jsonb", "date"]),
        prop::option::of(0..512i32),
        prop::option::of((1..38i32, 0..10i32)),
        any::<bool>(),
    )
        .prop_map(|(name, ty, length, numeric, nullable)| {
            let mut col = Column::new(name, ty);
            col.length = length;
            if let Some((p, s)) = numeric {
                col = col.with_precision(p, s);
            }
            if !nullable {
                col = col.not_null();
            }
            col
        })
}

fn table() -> impl Strategy<Value = Table> {
    (name(), prop::collection::vec(column(), 1..6), any::<prop::sample::Index>()).prop_map(
        |(name, mut columns, pk)| {
            let key = pk.index(columns.len());
            columns[key].is_primary_key = true;
            columns[key].is_nullable = false;
            Table {
                name,
                primary_keys: vec![columns[key].name.clone()],
                columns,
                ..Table::default()
            }
        },
    )
}

fn schema() -> impl Strategy<Value = Schema> {
    prop::collection::vec(table(), 0..5).prop_map(|tables| {
        let mut schema = Schema::new(Backend::Postgres);
        for pair in tables.windows(2) {
            schema.foreign_keys.push(ForeignKey {
                name: ForeignKey::synthetic_name(&pair[1].name, &pair[1].columns[0].name),
                table: pair[1].name.clone(),
                column: pair[1].columns[0].name.clone(),
                referenced_table: pair[0].name.clone(),
                referenced_column: pair[0].primary_keys[0].clone(),
                ..ForeignKey::default()
            });
        }
        schema.tables = tables;
        schema
    })
}

proptest! {
    #[test]
    fn filter_is_idempotent(
        candidate in name(),
        include in prop::collection::vec(name(), 0..4),
        exclude in prop::collection::vec(name(), 0..4),
    ) {
        let first = should_include(&candidate, &include, &exclude);
        let second = should_include(&candidate, &include, &exclude);
        prop_assert_eq!(first, second);

        let policy = FilterPolicy::new(&include, &exclude);
        prop_assert_eq!(policy.includes(&candidate), first);
    }

    #[test]
    fn exclude_wins_over_include(candidate in name(), others in prop::collection::vec(name(), 0..4)) {
        let mut include = others.clone();
        include.push(candidate.clone());
        let exclude = vec![candidate.to_uppercase()];
        prop_assert!(!should_include(&candidate, &include, &exclude));
    }

    #[test]
    fn empty_lists_keep_everything(candidate in name(), other in name()) {
        let policy = FilterPolicy::allow_all();
        prop_assert!(policy.includes(&candidate));
        prop_assert!(policy.includes_relation(&candidate, &other));
    }

    #[test]
    fn relation_kept_when_either_side_included(owning in name(), referenced in name()) {
        let policy = FilterPolicy::new(&[referenced.clone()], &[]);
        prop_assert!(policy.includes_relation(&owning, &referenced));
        let policy = FilterPolicy::new(&[owning.clone()], &[]);
        prop_assert!(policy.includes_relation(&owning, &referenced));
    }

    #[test]
    fn rendering_is_deterministic(schema in schema()) {
        for format in [OutputFormat::Mermaid, OutputFormat::PlantUml, OutputFormat::Graphviz] {
            prop_assert_eq!(render(&schema, format), render(&schema, format));
        }
    }

    #[test]
    fn primary_keys_name_existing_columns(table in table()) {
        prop_assert!(table.dangling_primary_keys().is_empty());
        for pk in &table.primary_keys {
            prop_assert!(table.columns.iter().any(|c| &c.name == pk));
        }
    }

    #[test]
    fn mermaid_counts_match_schema(schema in schema()) {
        let out = render(&schema, OutputFormat::Mermaid);
        let tables_line = format!("Total Tables: {}\n", schema.tables.len());
        let keys_line = format!("Total Foreign Keys: {}\n", schema.foreign_keys.len());
        prop_assert!(out.contains(&tables_line));
        prop_assert!(out.contains(&keys_line));
    }
}
