//! End-to-end pipeline tests: source text through compilation, linking
//! and parallel execution against real grids.

use voxl_compiler::{Compiler, CompilerOptions, DiagnosticKind};
use voxl_runtime::{compare_volumes, PointGrid, Transform, VolumeGrid};
use voxl_types::{ArrayValue, AxType, Scalar, ScalarType, Value};

fn f32_grid(name: &str, voxels: &[([i32; 3], f32)]) -> VolumeGrid {
    let mut grid = VolumeGrid::new(name, AxType::Scalar(ScalarType::F32), Transform::default());
    for (coord, v) in voxels {
        grid.set_voxel(*coord, Value::Scalar(Scalar::F32(*v)));
    }
    grid
}

fn i32_grid(name: &str, voxels: &[([i32; 3], i32)]) -> VolumeGrid {
    let mut grid = VolumeGrid::new(name, AxType::Scalar(ScalarType::I32), Transform::default());
    for (coord, v) in voxels {
        grid.set_voxel(*coord, Value::Scalar(Scalar::I32(*v)));
    }
    grid
}

fn vec3f(x: f32, y: f32, z: f32) -> Value {
    Value::Array(ArrayValue::new(
        ScalarType::F32,
        vec![Scalar::F32(x), Scalar::F32(y), Scalar::F32(z)],
    ))
}

fn run_volume(source: &str, grids: &mut Vec<VolumeGrid>) {
    let compiler = Compiler::new();
    let output = compiler
        .compile_volume(source, &CompilerOptions::default())
        .unwrap_or_else(|e| panic!("compile failed:\n{e}"));
    output.executable.execute(grids).expect("execution succeeds");
}

#[test]
fn density_increment() {
    let mut grids = vec![f32_grid(
        "density",
        &[([0, 0, 0], 2.0), ([1, 0, 0], 3.5)],
    )];
    run_volume("@density = @density + 1.0f;", &mut grids);
    let expected = f32_grid("density", &[([0, 0, 0], 3.0), ([1, 0, 0], 4.5)]);
    let report = compare_volumes(&grids[0], &expected, 1e-6);
    assert!(report.matches(), "{:?}", report.failures);
}

#[test]
fn conditional_creates_int_attribute() {
    let mut grids = vec![f32_grid(
        "density",
        &[([0, 0, 0], 4.0), ([1, 0, 0], 6.0)],
    )];
    run_volume(
        "i@count = 0; if (@density > 5.0f) i@count = 1;",
        &mut grids,
    );
    let count = grids.iter().find(|g| g.name == "count").expect("created");
    assert_eq!(count.ty, AxType::Scalar(ScalarType::I32));
    assert_eq!(count.voxel([0, 0, 0]), Some(&Value::Scalar(Scalar::I32(0))));
    assert_eq!(count.voxel([1, 0, 0]), Some(&Value::Scalar(Scalar::I32(1))));
}

#[test]
fn point_positions_translate() {
    let mut grid = PointGrid::new(Transform::default());
    grid.add_leaf(
        [0, 0, 0],
        vec![vec3f(0.0, 0.0, 0.0), vec3f(1.0, 2.0, 3.0)],
    );
    grid.add_leaf([8, 0, 0], vec![vec3f(9.0, 0.0, 0.0)]);

    let compiler = Compiler::new();
    let output = compiler
        .compile_points("v@P += {0.0f, 1.0f, 0.0f};", &CompilerOptions::default())
        .unwrap();
    output.executable.execute(&mut grid).unwrap();

    let leaf = &grid.leaves()[0];
    assert_eq!(leaf.attribute("P").unwrap()[0], vec3f(0.0, 1.0, 0.0));
    assert_eq!(leaf.attribute("P").unwrap()[1], vec3f(1.0, 3.0, 3.0));
    assert_eq!(grid.leaves()[1].attribute("P").unwrap()[0], vec3f(9.0, 1.0, 0.0));
}

#[test]
fn narrowing_truncates_and_warns() {
    let compiler = Compiler::new();
    let output = compiler
        .compile_volume("i@a = i@a * 2; i@a = i@a + 0.5;", &CompilerOptions::default())
        .unwrap();
    assert_eq!(output.warnings.len(), 1);
    assert_eq!(output.warnings[0].kind, DiagnosticKind::Type);

    let mut grids = vec![i32_grid("a", &[([0, 0, 0], 3)])];
    output.executable.execute(&mut grids).unwrap();
    assert_eq!(
        grids[0].voxel([0, 0, 0]),
        Some(&Value::Scalar(Scalar::I32(6)))
    );
}

#[test]
fn kernel_purity_identical_runs() {
    let source = "@density = @density * 2.0f + float(rand(3.0));";
    let voxels: Vec<([i32; 3], f32)> = (0..32).map(|i| ([i, 0, 0], i as f32)).collect();

    let mut first = vec![f32_grid("density", &voxels)];
    let mut second = vec![f32_grid("density", &voxels)];
    let compiler = Compiler::new();
    let output = compiler
        .compile_volume(source, &CompilerOptions::default())
        .unwrap();
    output.executable.execute(&mut first).unwrap();
    output.executable.execute(&mut second).unwrap();
    let report = compare_volumes(&first[0], &second[0], 0.0);
    assert!(report.matches(), "{:?}", report.failures);
}

#[test]
fn leaf_locality_permutation() {
    // Two leaves apart in index space; processing them together must
    // equal processing them in isolation.
    let source = "@density = @density * 3.0f;";
    let leaf_a: Vec<([i32; 3], f32)> = vec![([0, 0, 0], 1.0), ([3, 3, 3], 2.0)];
    let leaf_b: Vec<([i32; 3], f32)> = vec![([16, 0, 0], 5.0)];

    let compiler = Compiler::new();
    let output = compiler
        .compile_volume(source, &CompilerOptions::default())
        .unwrap();

    let mut both: Vec<([i32; 3], f32)> = leaf_a.clone();
    both.extend(&leaf_b);
    let mut combined = vec![f32_grid("density", &both)];
    output.executable.execute(&mut combined).unwrap();

    let mut only_a = vec![f32_grid("density", &leaf_a)];
    let mut only_b = vec![f32_grid("density", &leaf_b)];
    output.executable.execute(&mut only_a).unwrap();
    output.executable.execute(&mut only_b).unwrap();

    for (coord, value) in only_a[0].iter_active().chain(only_b[0].iter_active()) {
        assert_eq!(combined[0].voxel(coord), Some(value));
    }
}

#[test]
fn groups_created_by_point_kernels() {
    let mut grid = PointGrid::new(Transform::default());
    grid.add_leaf(
        [0, 0, 0],
        vec![vec3f(0.0, 0.0, 0.0), vec3f(2.0, 0.0, 0.0)],
    );

    let compiler = Compiler::new();
    let output = compiler
        .compile_points(
            "if (v@P[0] > 1.0f) addtogroup(\"far\");",
            &CompilerOptions::default(),
        )
        .unwrap();
    output.executable.execute(&mut grid).unwrap();

    assert!(grid.descriptor().has_group("far"));
    let leaf = &grid.leaves()[0];
    assert!(!leaf.in_group("far", 0));
    assert!(leaf.in_group("far", 1));
}

#[test]
fn group_membership_read_back() {
    let mut grid = PointGrid::new(Transform::default());
    grid.add_leaf([0, 0, 0], vec![vec3f(0.0, 0.0, 0.0), vec3f(1.0, 0.0, 0.0)]);
    grid.ensure_group("hot");
    grid.leaves_mut()[0].set_group("hot", 0, true);

    let compiler = Compiler::new();
    let output = compiler
        .compile_points(
            "i@tag = 0; if (ingroup(\"hot\")) i@tag = 7;",
            &CompilerOptions::default(),
        )
        .unwrap();
    output.executable.execute(&mut grid).unwrap();

    let leaf = &grid.leaves()[0];
    assert_eq!(leaf.attribute("tag").unwrap()[0], Value::Scalar(Scalar::I32(7)));
    assert_eq!(leaf.attribute("tag").unwrap()[1], Value::Scalar(Scalar::I32(0)));
}

#[test]
fn custom_data_lookup() {
    let mut options = CompilerOptions::default();
    options
        .custom_data
        .insert("gain".to_string(), Value::Scalar(Scalar::F32(2.5)));

    let compiler = Compiler::new();
    let output = compiler
        .compile_volume("@a = lookupf(\"gain\");", &options)
        .unwrap();
    let mut grids = vec![f32_grid("a", &[([0, 0, 0], 0.0)])];
    output.executable.execute(&mut grids).unwrap();
    assert_eq!(
        grids[0].voxel([0, 0, 0]),
        Some(&Value::Scalar(Scalar::F32(2.5)))
    );
}

#[test]
fn coordinate_builtins_see_the_voxel() {
    let compiler = Compiler::new();
    let output = compiler
        .compile_volume("i@x = getcoordx(); i@z = getcoordz();", &CompilerOptions::default())
        .unwrap();
    let mut grids = vec![
        i32_grid("x", &[([5, 0, 9], 0)]),
        i32_grid("z", &[([5, 0, 9], 0)]),
    ];
    output.executable.execute(&mut grids).unwrap();
    assert_eq!(grids[0].voxel([5, 0, 9]), Some(&Value::Scalar(Scalar::I32(5))));
    assert_eq!(grids[1].voxel([5, 0, 9]), Some(&Value::Scalar(Scalar::I32(9))));
}

#[test]
fn grid_type_conflict_is_an_attribute_error() {
    let compiler = Compiler::new();
    let output = compiler
        .compile_volume("@a = 1.0f;", &CompilerOptions::default())
        .unwrap();
    // Grid exists with an int type; kernel expects float.
    let mut grids = vec![i32_grid("a", &[([0, 0, 0], 1)])];
    let err = output.executable.execute(&mut grids).unwrap_err();
    assert!(matches!(
        err,
        voxl_runtime::RuntimeError::Attribute { .. }
    ));
}

#[test]
fn world_space_positions_respect_the_transform() {
    let transform = Transform::with_voxel_size(0.5);
    let mut grid = VolumeGrid::new("wx", AxType::Scalar(ScalarType::F32), transform);
    grid.set_voxel([4, 0, 0], Value::Scalar(Scalar::F32(0.0)));

    let compiler = Compiler::new();
    let output = compiler
        .compile_volume("@wx = float(getvoxelpws()[0]);", &CompilerOptions::default())
        .unwrap();
    let mut grids = vec![grid];
    output.executable.execute(&mut grids).unwrap();
    assert_eq!(
        grids[0].voxel([4, 0, 0]),
        Some(&Value::Scalar(Scalar::F32(2.0)))
    );
}
