#![feature(test)]

extern crate test;

use test::Bencher;
use trackfeat::options::ExtractionOptions;
use trackfeat::prelude::NoopDisplay;
use trackfeat::subwindow::get_subwindow;
use trackfeat::test_stuff::{gradient_image, BoxGen};

#[bench]
fn subwindow_0064(b: &mut Bencher) {
    bench_subwindow(64.0, b);
}

#[bench]
fn subwindow_0128(b: &mut Bencher) {
    bench_subwindow(128.0, b);
}

#[bench]
fn subwindow_0256(b: &mut Bencher) {
    bench_subwindow(256.0, b);
}

fn bench_subwindow(side: f32, b: &mut Bencher) {
    let frame = gradient_image(480, 640);
    let opts = ExtractionOptions::default();
    let mut boxes = BoxGen::new(200.0, 150.0, side, side, 10.0, 1.0);

    b.iter(|| {
        let bbox = boxes.next().unwrap();
        get_subwindow(frame.view(), &bbox, (224, 224), &opts, &mut NoopDisplay).unwrap();
    });
}
