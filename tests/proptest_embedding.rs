//! Property tests for embedding, presentation round trips and identities.

use std::collections::HashSet;

use proptest::prelude::*;
use storyline::embed::{self, EmbeddedBlock, Marker};
use storyline::{Comment, Context, FileRef, IdentityGenerator, Presentation, VisualId};

fn config() -> ProptestConfig {
    ProptestConfig::with_cases(128)
}

/// Comments whose trailing whitespace is not a lone newline after text, the
/// one shape the block separator cannot be told apart from.
fn arb_comment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,!?#*\n\t-]{0,80}".prop_filter("lone trailing newline", |comment| {
        comment
            .strip_suffix('\n')
            .is_none_or(|rest| !rest.ends_with(|ch: char| !ch.is_whitespace()))
    })
}

fn arb_comments() -> impl Strategy<Value = Vec<(String, u64, String)>> {
    prop::collection::vec(
        ("[a-z]{1,8}\\.rs", 1_u64..500, "[ -~]{0,40}"),
        0..12,
    )
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn rendered_blocks_parse_back(comment in arb_comment(), version in 0_u64..1_000) {
        let marker = Marker::default();
        let data = serde_json::json!({ "metadata": { "version": version } });
        let rendered = embed::render(&EmbeddedBlock::new(comment.clone(), data.clone()), &marker);

        let parsed = embed::parse(&rendered, &marker);

        prop_assert_eq!(parsed, Some(EmbeddedBlock::new(comment, data)));
    }

    #[test]
    fn normalisation_is_stable(comment in "[a-z \n]{0,40}") {
        let marker = Marker::new("MMM");
        let data = serde_json::json!([1, 2]);
        let once = embed::parse(&embed::render(&EmbeddedBlock::new(comment, data.clone()), &marker), &marker)
            .expect("first parse");
        let twice = embed::parse(&embed::render(&once, &marker), &marker).expect("second parse");

        prop_assert_eq!(once, twice);
    }

    #[test]
    fn export_then_import_restores_order(entries in arb_comments()) {
        let mut ids = IdentityGenerator::new();
        let mut original = Presentation::new();
        for (file, line, text) in entries {
            let comment = Comment::create(&mut ids, Context::new(FileRef::new(file), line)).with_text(text);
            original.add_or_replace_visual(comment.into(), Some(0));
        }

        let mut restored = Presentation::new();
        let report = restored.import(&original.export());

        prop_assert_eq!(report.imported, original.len());
        prop_assert_eq!(report.skipped, 0);
        prop_assert_eq!(restored.visuals(), original.visuals());
    }

    #[test]
    fn generated_identities_are_unique_and_increasing(seed in 0_u64..1_000_000, count in 1_usize..200) {
        let mut ids = IdentityGenerator::new();
        ids.init_id(seed);

        let issued: Vec<VisualId> = (0..count).map(|_| ids.next_id()).collect();
        let numeric: Vec<u64> = issued.iter().filter_map(VisualId::numeric).collect();
        let unique: HashSet<&VisualId> = issued.iter().collect();

        prop_assert_eq!(unique.len(), count);
        prop_assert_eq!(numeric.first().copied(), Some(seed + 1));
        prop_assert!(numeric.windows(2).all(|pair| matches!(pair, [earlier, later] if earlier < later)));
    }
}
