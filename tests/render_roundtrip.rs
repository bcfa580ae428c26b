//! Property tests: generated definition files parse deterministically, and
//! rendering a forest back to text and re-parsing it gives the same forest.

use cmtdef::{parse_def, render_source};
use proptest::prelude::*;

fn ident() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Z][A-Z0-9_]{0,6}").unwrap()
}

fn segment() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z][a-z0-9]{0,5}").unwrap()
}

#[derive(Debug, Clone)]
struct GenField {
    desc: String,
    seg: String,
    required: bool,
    signed: bool,
    ty: String,
}

#[derive(Debug, Clone)]
struct GenEntity {
    fields: Vec<GenField>,
    /// Index of an earlier entity to nest under, resolved against its fields.
    parent: Option<prop::sample::Index>,
    /// Which field of the parent the entity embeds into.
    slot: prop::sample::Index,
}

fn gen_field() -> impl Strategy<Value = GenField> {
    (ident(), segment(), any::<bool>(), any::<bool>(), segment()).prop_map(
        |(desc, seg, required, signed, ty)| GenField {
            desc,
            seg,
            required,
            signed,
            ty,
        },
    )
}

fn gen_entity() -> impl Strategy<Value = GenEntity> {
    (
        proptest::collection::vec(gen_field(), 1..5),
        proptest::option::of(any::<prop::sample::Index>()),
        any::<prop::sample::Index>(),
    )
        .prop_map(|(fields, parent, slot)| GenEntity {
            fields,
            parent,
            slot,
        })
}

/// Render generated entities as definition text. Entity `i` has code `E{i}` and path
/// `/e{i}`; a nested entity takes the path of one of its parent's fields.
fn to_source(entities: &[GenEntity]) -> String {
    let mut field_paths: Vec<Vec<String>> = Vec::new();
    let mut claimed: Vec<String> = Vec::new();
    let mut out = String::from("# generated\n");
    for (i, e) in entities.iter().enumerate() {
        let mut parent = "NULL".to_string();
        let mut path = format!("/e{}", i);
        if let (Some(p), true) = (&e.parent, i > 0) {
            let pi = p.index(i);
            let candidate = e.slot.get(&field_paths[pi]).clone();
            if !claimed.contains(&candidate) {
                claimed.push(candidate.clone());
                parent = format!("E{}", pi);
                path = candidate;
            }
        }
        out.push_str(&format!(
            "CMTCODE:E{} v1 PATH:{} ParentCMTCODE:{}\n",
            i, path, parent
        ));
        let mut fps = Vec::new();
        for (j, f) in e.fields.iter().enumerate() {
            let fp = format!("{}/{}{}", path, f.seg, j);
            out.push_str(&format!(
                "T{} {} {} {} {} {}\n",
                j,
                f.desc,
                fp,
                if f.required { "M" } else { "O" },
                if f.signed { "y" } else { "n" },
                f.ty
            ));
            fps.push(fp);
        }
        field_paths.push(fps);
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn parse_is_deterministic(entities in proptest::collection::vec(gen_entity(), 1..8)) {
        let src = to_source(&entities);
        let a = parse_def(&src).expect("generated source parses");
        let b = parse_def(&src).expect("generated source parses");
        prop_assert_eq!(a, b);
    }

    #[test]
    fn render_then_reparse(entities in proptest::collection::vec(gen_entity(), 1..8)) {
        let src = to_source(&entities);
        let forest = parse_def(&src).expect("generated source parses");
        let rendered = render_source(&forest);
        let again = parse_def(&rendered).expect("rendered source parses");
        prop_assert_eq!(render_source(&again), rendered);
        prop_assert_eq!(again, forest);
    }

    #[test]
    fn every_entity_is_reachable(entities in proptest::collection::vec(gen_entity(), 1..8)) {
        let src = to_source(&entities);
        let forest = parse_def(&src).expect("generated source parses");
        for i in 0..entities.len() {
            let code = format!("E{}", i);
            prop_assert!(forest.find(&code).is_some(), "{} missing", code);
        }
    }
}
