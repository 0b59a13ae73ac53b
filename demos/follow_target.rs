use anyhow::Result;
use log::info;
use ndarray::Array1;
use trackfeat::diagnostics::{show_heatmap_over_image, DisplaySink};
use trackfeat::features::patch::generate_patch_features;
use trackfeat::features::selection::{features_selection, SelectionMode};
use trackfeat::features::{get_subwindow_feature, LayerSelector};
use trackfeat::options::ExtractionOptions;
use trackfeat::prelude::{NoopDisplay, PngDisplay};
use trackfeat::test_stuff::{gradient_image, BoxGen, StridedMeanExtractor};
use trackfeat::utils::resize::resize_tensor;

const INPUT_SIZE: (usize, usize) = (224, 224);
const SEARCH_SCALE: f32 = 2.5;

/// Runs the extraction pipeline over a synthetic drifting target.
///
/// `RUST_LOG=debug cargo run --example follow_target [png-dir]` writes the heatmap overlays
/// into `png-dir` when it is given.
///
fn main() -> Result<()> {
    env_logger::init();

    let mut sink: Box<dyn DisplaySink> = match std::env::args().nth(1) {
        Some(dir) => Box::new(PngDisplay::new(dir)),
        None => Box::new(NoopDisplay),
    };

    let frame = gradient_image(480, 640);
    let model = StridedMeanExtractor::new(&[4, 8]);
    let options = ExtractionOptions::default();
    let layers = LayerSelector::named(["conv4_1", "conv4_3"]);

    for (epoch, target) in BoxGen::new(280.0, 200.0, 60.0, 40.0, 5.0, 1.0)
        .take(10)
        .enumerate()
    {
        let search = target.scaled(SEARCH_SCALE)?;
        let raw = get_subwindow_feature(
            &model,
            frame.view(),
            &search,
            INPUT_SIZE,
            &layers,
            &options,
        )?;

        // bring every layer to the resolution of the first one
        let (_, _, height, width) = raw[0].dim();
        let aligned = raw
            .iter()
            .map(|f| resize_tensor(f.view(), (height, width), true))
            .collect::<Result<Vec<_>>>()?;

        let patches = generate_patch_features(&target.size(), &search, &aligned)?;
        let weights = patches
            .features
            .iter()
            .map(|f| Array1::from_iter((0..f.dim().1).map(|c| (c != 1) as u8 as f32)))
            .collect::<Vec<_>>();
        let selected = features_selection(
            &patches.features,
            &weights,
            &[1.0, 0.5],
            SelectionMode::Reduction,
        )?;

        show_heatmap_over_image(
            Some(&search),
            frame.view(),
            INPUT_SIZE,
            &patches.features,
            sink.as_mut(),
        )?;

        info!(
            "Epoch {}: target {:?}, patches {:?}, selected features {:?}",
            epoch,
            target,
            patches.locations,
            selected.shape()
        );
    }
    Ok(())
}
