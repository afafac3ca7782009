#[macro_use]
extern crate log;

use anyhow::{ Context, Result };
use clap::Parser;
use image::Rgb;

use std::fs;
use std::path::{ Path, PathBuf };
use std::process::ExitCode;

use swt_text::config::{ load_suite, TestCase };
use swt_text::render::{ colorize_labels, draw_boxes, normalize, ray_image };
use swt_text::detect_words;

const RED: Rgb<u8> = Rgb([255, 0, 0]);
const GREEN: Rgb<u8> = Rgb([0, 200, 0]);

/// Detect text in a batch of images, writing the output of every stage.
#[derive(Parser, Debug)]
#[command(name = "swt-text", version)]
struct Args {
    /// JSON file listing the test cases.
    suite: PathBuf,

    /// Directory receiving one subdirectory of images per test case.
    #[arg(long, default_value = "output")]
    output: PathBuf,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let suite = match load_suite(&args.suite) {
        Ok(suite) => suite,
        Err(err) => {
            error!("{}", err);
            return ExitCode::FAILURE;
        }
    };
    // Image paths are relative to the suite file.
    let base = args.suite.parent().unwrap_or_else(|| Path::new("."));

    let mut failures = 0;
    for case in &suite.testcases {
        info!("{}: processing {}", case.name, case.image_path.display());
        if let Err(err) = process(case, base, &args.output) {
            error!("{}: {:#}", case.name, err);
            failures += 1;
        }
    }
    info!("{} test cases, {} failed", suite.testcases.len(), failures);
    if failures > 0 { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

fn process(case: &TestCase, base: &Path, output: &Path) -> Result<()> {
    let path = base.join(&case.image_path);
    let input = image::open(&path)
        .with_context(|| format!("could not read image {}", path.display()))?
        .to_rgb8();
    let detection = detect_words(&input, &case.params)
        .with_context(|| format!("could not process {}", path.display()))?;

    let dir = output.join(&case.name);
    fs::create_dir_all(&dir)
        .with_context(|| format!("could not create {}", dir.display()))?;
    let save = |name: &str, write: &dyn Fn(&Path) -> image::ImageResult<()>| -> Result<()> {
        let file = dir.join(format!("{}.png", name));
        write(&file).with_context(|| format!("could not write {}", file.display()))
    };

    save("00_grayscale", &|f| detection.gray.save(f))?;
    save("01_gradient_magnitude", &|f| normalize(&detection.gradient.magnitude).save(f))?;
    save("02_edges", &|f| detection.edges.save(f))?;
    save("03_rays", &|f| ray_image(&detection.rays, input.dimensions()).save(f))?;
    save("04_swt", &|f| normalize(&detection.stroke_widths).save(f))?;

    let components = colorize_labels(&detection.labels);
    save("05_connected_components", &|f| components.save(f))?;
    let mut boxes = components.clone();
    draw_boxes(&mut boxes, &detection.bounding_boxes, RED);
    save("06_bounding_boxes", &|f| boxes.save(f))?;

    let mut text = colorize_labels(&detection.text.labels);
    draw_boxes(&mut text, &detection.text.bounding_boxes, RED);
    save("07_discard_non_text", &|f| text.save(f))?;

    let mut groups = colorize_labels(&detection.text.labels);
    draw_boxes(&mut groups, detection.letters(), GREEN);
    draw_boxes(&mut groups, detection.words(), RED);
    save("08_letter_groups", &|f| groups.save(f))?;

    let mut result = input.clone();
    draw_boxes(&mut result, detection.words(), RED);
    save("09_final", &|f| result.save(f))?;

    info!("{}: {} components, {} letters, {} words", case.name,
          detection.components.len(), detection.text.components.len(), detection.words().len());
    Ok(())
}
