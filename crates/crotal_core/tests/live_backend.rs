//! Scenarios against a real backend. Run with
//! `CROTALPATH_SERVER=http://host:port/ cargo test -- --ignored`.

use crotal_core::{
    CancellationToken, Config, FileSelection, HttpTaskApi, RenderedCard, SelectedFile,
    UploadWorkflow,
};
use std::io::Cursor;
use std::sync::Arc;

fn live_workflow() -> UploadWorkflow<HttpTaskApi> {
    let config = Config::default().with_env_overrides();
    let api = HttpTaskApi::new(&config.server.base_url, config.request_timeout())
        .expect("backend url");
    UploadWorkflow::new(
        Arc::new(api),
        config.poll_policy(),
        config.overlay_style().expect("overlay style"),
    )
}

fn blank(name: &str, format: image::ImageFormat) -> SelectedFile {
    let img = image::RgbImage::from_pixel(64, 48, image::Rgb([255, 255, 255]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format)
        .expect("encode");
    SelectedFile::from_bytes(name, bytes)
}

#[tokio::test]
#[ignore = "needs a running crotalpath backend"]
async fn live_blank_images_get_one_card_each() {
    let selection = FileSelection::new(vec![
        blank("blank.png", image::ImageFormat::Png),
        blank("blank.tif", image::ImageFormat::Tiff),
    ])
    .expect("selection");

    let mut cards: Vec<RenderedCard> = Vec::new();
    let summary = live_workflow()
        .run(selection, &mut cards, &CancellationToken::new())
        .await
        .expect("batch");

    assert_eq!(summary.rendered + summary.failed, 2);
    let names: Vec<&str> = cards.iter().map(|c| c.file_name.as_str()).collect();
    assert_eq!(names, ["blank.png", "blank.tif"]);
}

#[tokio::test]
#[ignore = "needs a running crotalpath backend"]
async fn live_cancelled_batch_renders_nothing() {
    let selection =
        FileSelection::new(vec![blank("blank.png", image::ImageFormat::Png)]).expect("selection");
    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut cards: Vec<RenderedCard> = Vec::new();
    let outcome = live_workflow().run(selection, &mut cards, &cancel).await;

    assert!(outcome.is_err());
    assert!(cards.is_empty());
}
