use stipple::resources::gltf::parse_glb;

/// Assemble a binary glTF container from a JSON chunk and a binary chunk.
fn build_glb(json: &str, bin: &[u8]) -> Vec<u8> {
    let mut json_bytes = json.as_bytes().to_vec();
    while json_bytes.len() % 4 != 0 {
        json_bytes.push(b' ');
    }
    let mut bin_bytes = bin.to_vec();
    while bin_bytes.len() % 4 != 0 {
        bin_bytes.push(0);
    }

    let mut total = 12 + 8 + json_bytes.len();
    if !bin.is_empty() {
        total += 8 + bin_bytes.len();
    }

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json_bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(b"JSON");
    out.extend_from_slice(&json_bytes);
    if !bin.is_empty() {
        out.extend_from_slice(&(bin_bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(b"BIN\0");
        out.extend_from_slice(&bin_bytes);
    }
    out
}

/// One right triangle in the xy plane, indexed, no normals or UVs,
/// attached to a node translated one unit along x.
fn triangle_glb(extra_root_json: &str) -> Vec<u8> {
    let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    let indices: [u16; 3] = [0, 1, 2];

    let mut bin = Vec::new();
    for p in positions {
        for c in p {
            bin.extend_from_slice(&c.to_le_bytes());
        }
    }
    for i in indices {
        bin.extend_from_slice(&i.to_le_bytes());
    }

    let json = format!(
        r#"{{
            "asset": {{"version": "2.0"}},
            {extra_root_json}
            "scene": 0,
            "scenes": [{{"nodes": [0]}}],
            "nodes": [{{"mesh": 0, "translation": [1.0, 0.0, 0.0]}}],
            "meshes": [{{
                "name": "tri",
                "primitives": [{{"attributes": {{"POSITION": 0}}, "indices": 1}}]
            }}],
            "buffers": [{{"byteLength": {len}}}],
            "bufferViews": [
                {{"buffer": 0, "byteOffset": 0, "byteLength": 36}},
                {{"buffer": 0, "byteOffset": 36, "byteLength": 6}}
            ],
            "accessors": [
                {{
                    "bufferView": 0, "componentType": 5126, "count": 3,
                    "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
                }},
                {{"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"}}
            ]
        }}"#,
        len = bin.len(),
    );

    build_glb(&json, &bin)
}

#[test]
fn parses_embedded_glb() {
    let glb = triangle_glb("");
    let meshes = parse_glb(&glb).unwrap();

    assert_eq!(meshes.len(), 1);
    let mesh = &meshes[0];
    assert_eq!(mesh.name, "tri");
    assert_eq!(mesh.positions.len(), 3);
    assert_eq!(mesh.indices, vec![0, 1, 2]);

    // The node translation is baked into the positions.
    assert_eq!(mesh.positions[0], [1.0, 0.0, 0.0]);
    assert_eq!(mesh.positions[1], [2.0, 0.0, 0.0]);
    assert_eq!(mesh.positions[2], [1.0, 1.0, 0.0]);
}

#[test]
fn generates_normals_when_absent() {
    let glb = triangle_glb("");
    let meshes = parse_glb(&glb).unwrap();

    let normals = &meshes[0].normals;
    assert_eq!(normals.len(), 3);
    for n in normals {
        // Counter-clockwise winding in the xy plane faces +z.
        assert!((n[0]).abs() < 1e-6);
        assert!((n[1]).abs() < 1e-6);
        assert!((n[2] - 1.0).abs() < 1e-6);
    }
}

#[test]
fn rejects_draco_compressed_files() {
    let glb = triangle_glb(
        r#""extensionsUsed": ["KHR_draco_mesh_compression"],
           "extensionsRequired": ["KHR_draco_mesh_compression"],"#,
    );
    assert!(parse_glb(&glb).is_err());
}

#[test]
fn rejects_scenes_without_meshes() {
    let json = r#"{
        "asset": {"version": "2.0"},
        "scene": 0,
        "scenes": [{"nodes": [0]}],
        "nodes": [{"name": "empty"}]
    }"#;
    let glb = build_glb(json, &[]);

    let err = parse_glb(&glb).unwrap_err();
    assert!(err.to_string().contains("no mesh"));
}
