//! Integration test: two JPEG sources through the full benchmark flow.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::Path;

use augbench::{BenchConfig, Experiment, OutputPolicy, output_name, run_experiment};
use image::{Rgb, RgbImage};

fn write_jpeg(path: &Path, width: u32, height: u32) {
    RgbImage::from_fn(width, height, |x, y| {
        #[allow(clippy::cast_possible_truncation)]
        let v = ((x * 7 + y * 13) % 256) as u8;
        Rgb([v, 255 - v, (v / 2) + 40])
    })
    .save(path)
    .unwrap();
}

fn sorted_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    names
}

fn config(root: &Path, output: &str, pool_sizes: Vec<usize>) -> BenchConfig {
    BenchConfig {
        input_dir: root.join("Input_Images"),
        output_dir: root.join(output),
        pool_sizes,
        seed: 3,
        output_policy: OutputPolicy::Overwrite,
        stages: Some(5),
        chart_dir: None,
    }
}

fn setup() -> tempfile::TempDir {
    let root = tempfile::tempdir().unwrap();
    let input = root.path().join("Input_Images");
    std::fs::create_dir(&input).unwrap();
    write_jpeg(&input.join("a.jpg"), 48, 32);
    write_jpeg(&input.join("b.jpg"), 24, 24);
    root
}

#[test]
fn two_images_five_stages() {
    let root = setup();
    let config = config(root.path(), "Augmented_Images", vec![1, 2, 4]);

    let result = run_experiment(
        &config,
        &config.pipeline(),
        &Experiment::largest_first(),
        &mut (),
    )
    .expect("experiment should succeed");

    assert_eq!(result.label, "Largest to Smallest - 2 Images");
    let sizes: Vec<usize> = result.samples.iter().map(|s| s.pool_size).collect();
    assert_eq!(sizes, [1, 2, 4]);
    assert!(result.samples.iter().all(|s| s.elapsed_secs >= 0.0));

    assert_eq!(
        sorted_names(&config.output_dir),
        ["a".to_owned(), "b".to_owned()]
    );
    for stem in ["a", "b"] {
        let source = format!("{stem}.jpg");
        let mut expected: Vec<String> = (0..32).map(|i| output_name(i, &source)).collect();
        expected.sort();
        assert_eq!(sorted_names(&config.output_dir.join(stem)), expected);
    }
}

#[test]
fn output_is_independent_of_pool_size() {
    let root = setup();
    let sequential = config(root.path(), "sequential", vec![1]);
    let parallel = config(root.path(), "parallel", vec![4]);

    for config in [&sequential, &parallel] {
        run_experiment(
            config,
            &config.pipeline(),
            &Experiment::smallest_first(),
            &mut (),
        )
        .unwrap();
    }

    for stem in ["a", "b"] {
        for name in sorted_names(&sequential.output_dir.join(stem)) {
            let a = std::fs::read(sequential.output_dir.join(stem).join(&name)).unwrap();
            let b = std::fs::read(parallel.output_dir.join(stem).join(&name)).unwrap();
            assert_eq!(a, b, "{stem}/{name} differs between pool sizes");
        }
    }
}

#[test]
fn corrupt_source_is_skipped() {
    let root = setup();
    std::fs::write(root.path().join("Input_Images/c.jpg"), b"garbage").unwrap();
    let config = config(root.path(), "out", vec![2]);

    let result = run_experiment(
        &config,
        &config.pipeline(),
        &Experiment::smallest_first(),
        &mut (),
    )
    .unwrap();

    assert_eq!(result.label, "Smallest to Largest - 3 Images");
    assert_eq!(
        sorted_names(&config.output_dir),
        ["a".to_owned(), "b".to_owned()]
    );
}
