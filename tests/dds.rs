//! DDS grammar tests: tree shape, ids, dimensions, and syntax failures.

use dapclient::{parse_dds, DapVar, DataType, Error, VarKind};

const NESTED: &str = r#"
Dataset {
    Int32 x;
    Structure {
        Float64 depth[depth = 4];
        Sequence {
            String station;
            Float32 temp;
        } casts;
    } profile;
    Grid {
      Array:
        Int16 sst[time = 2][lat = 3][lon = 4];
      Maps:
        Float64 time[time = 2];
        Float64 lat[lat = 3];
        Float64 lon[lon = 4];
    } sst;
} ocean;
"#;

fn all_nodes(root: &DapVar) -> Vec<&DapVar> {
    let mut out = Vec::new();
    root.walk(&mut |v| out.push(v));
    out
}

#[test]
fn parse_single_scalar() {
    let d = parse_dds("Dataset { Int32 x; } foo;").expect("parse");
    assert_eq!(d.name, "foo");
    assert_eq!(d.id, "foo");
    let children = d.children().expect("dataset children");
    assert_eq!(children.len(), 1);
    let x = d.child("x").expect("x");
    let base = x.as_base().expect("base");
    assert_eq!(base.data_type, DataType::Int32);
    assert!(base.shape.is_empty());
    assert!(base.dimensions.is_empty());
    assert!(x.attributes.is_empty());
}

#[test]
fn parse_named_dimensions() {
    let d = parse_dds("Dataset { Int32 x[lat=2][lon=3]; } foo;").expect("parse");
    let base = d.child("x").and_then(DapVar::as_base).expect("x");
    assert_eq!(
        base.dimensions,
        vec![Some("lat".to_string()), Some("lon".to_string())]
    );
    assert_eq!(base.shape, vec![2, 3]);
    assert_eq!(base.size(), 6);
}

#[test]
fn parse_unnamed_and_mixed_dimensions() {
    let d = parse_dds("Dataset { Byte b[5][ band = 2 ]; } foo;").expect("parse");
    let base = d.child("b").and_then(DapVar::as_base).expect("b");
    assert_eq!(base.dimensions, vec![None, Some("band".to_string())]);
    assert_eq!(base.shape, vec![5, 2]);
}

#[test]
fn parse_nested_containers() {
    let d = parse_dds(NESTED).expect("parse");
    assert_eq!(d.name, "ocean");
    let names: Vec<&str> = d.components().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["x", "profile", "sst"]);

    let profile = d.child("profile").expect("profile");
    assert!(matches!(profile.kind, VarKind::Structure { .. }));
    let casts = profile.child("casts").expect("casts");
    assert!(matches!(casts.kind, VarKind::Sequence { .. }));
    assert_eq!(casts.id, "ocean.profile.casts");
    assert_eq!(casts.child("temp").expect("temp").id, "ocean.profile.casts.temp");

    let grid = d.child("sst").and_then(DapVar::as_grid).expect("grid");
    assert_eq!(grid.array.name, "sst");
    assert_eq!(grid.array.as_base().expect("array").shape, vec![2, 3, 4]);
    let maps: Vec<&str> = grid.maps.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(maps, vec!["time", "lat", "lon"]);
    assert_eq!(grid.maps.get("lat").expect("lat").id, "ocean.sst.lat");
}

#[test]
fn ids_extend_parent_ids() {
    let d = parse_dds(NESTED).expect("parse");
    fn check(parent: &DapVar) {
        for c in parent.components() {
            assert_eq!(c.id, format!("{}.{}", parent.id, c.name));
            check(c);
        }
    }
    check(&d);
}

#[test]
fn shape_matches_dimensions_everywhere() {
    let d = parse_dds(NESTED).expect("parse");
    for node in all_nodes(&d) {
        if let Some(base) = node.as_base() {
            assert_eq!(base.shape.len(), base.dimensions.len(), "{}", node.id);
        }
    }
}

#[test]
fn parsing_twice_gives_equal_trees() {
    let a = parse_dds(NESTED).expect("first");
    let b = parse_dds(NESTED).expect("second");
    assert_eq!(a, b);
}

#[test]
fn keywords_are_case_insensitive() {
    let d = parse_dds("DATASET { STRUCTURE { float64 v; } s; GRID { ARRAY: int32 a[n=1]; MAPS: int32 n[n=1]; } g; } d;")
        .expect("parse");
    assert!(d.child("s").is_some());
    assert!(d.child("g").and_then(DapVar::as_grid).is_some());
    assert_eq!(
        d.child("s").and_then(|s| s.child("v")).and_then(DapVar::as_base).map(|b| b.data_type),
        Some(DataType::Float64)
    );
}

#[test]
fn duplicate_names_last_declaration_wins() {
    let d = parse_dds("Dataset { Int32 x; Float64 y; Byte x[2]; } d;").expect("parse");
    let names: Vec<&str> = d.components().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["x", "y"]);
    let x = d.child("x").and_then(DapVar::as_base).expect("x");
    assert_eq!(x.data_type, DataType::Byte);
    assert_eq!(x.shape, vec![2]);
}

#[test]
fn dataset_name_may_contain_dots_and_spaces() {
    let d = parse_dds("Dataset {\n  Float32 t;\n} sst.mnmean.nc ;\n").expect("parse");
    assert_eq!(d.name, "sst.mnmean.nc");
    assert_eq!(d.child("t").expect("t").id, "sst.mnmean.nc.t");
}

#[test]
fn all_atomic_types_parse() {
    let d = parse_dds(
        "Dataset { Byte a; Int b; UInt c; Int16 d; UInt16 e; Int32 f; UInt32 g; Float32 h; Float64 i; String j; Url k; Alias l; } t;",
    )
    .expect("parse");
    assert_eq!(d.components().len(), 12);
    assert_eq!(
        d.child("k").and_then(DapVar::as_base).map(|b| b.data_type),
        Some(DataType::Url)
    );
}

#[test]
fn missing_semicolon_is_syntax_error() {
    match parse_dds("Dataset { Int32 x } foo;") {
        Err(Error::Syntax { snippet, .. }) => assert!(snippet.starts_with('}')),
        other => panic!("expected syntax error, got {:?}", other),
    }
}

#[test]
fn unknown_type_is_rejected() {
    match parse_dds("Dataset { Complex64 z; } foo;") {
        Err(Error::InvalidLiteral { literal, position, .. }) => {
            assert_eq!(literal, "Complex64");
            assert_eq!(position, 10);
        }
        other => panic!("expected invalid literal, got {:?}", other),
    }
}

#[test]
fn non_numeric_extent_is_rejected() {
    assert!(matches!(
        parse_dds("Dataset { Int32 x[lat]; } foo;"),
        Err(Error::InvalidLiteral { .. })
    ));
    assert!(matches!(
        parse_dds("Dataset { Int32 x[lat = n]; } foo;"),
        Err(Error::Syntax { .. })
    ));
}

#[test]
fn truncated_input_fails_as_a_whole() {
    assert!(parse_dds("Dataset { Int32 x;").is_err());
    assert!(parse_dds("").is_err());
    assert!(parse_dds("Attributes { }").is_err());
}
