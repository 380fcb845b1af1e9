use anyhow::Context;
use panemap::{dom::MemoryDom, prelude::*};
use std::{cell::RefCell, rc::Rc};

/// Headless walkthrough: mounts a map in the in-memory document, adds an
/// overlay and a few markers, clicks around and prints the resulting tree.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let dom = MemoryDom::new();
    let container = dom.create_container("map", 800.0, 600.0);

    let clicks = Rc::new(RefCell::new(Vec::new()));
    let sink = clicks.clone();
    let options = MapOptions::default().on_click(move |e| sink.borrow_mut().push(e.latlng));
    let map = panemap::map(&dom, "map", options).context("failed to mount the map")?;

    map.on(MapEventKind::Click, |e| {
        log::info!("map clicked at ({:.3}, {:.3})", e.latlng.lat, e.latlng.lng);
    });

    let floorplan: ImageOverlay<MemoryDom> = panemap::image_overlay(
        "floorplan.png",
        [[-90.0, -180.0], [90.0, 180.0]],
        ImageOverlayOptions::default().with_opacity(0.8),
    );
    map.add_layer(floorplan)?
        .fit_bounds([[-90.0, -180.0], [90.0, 180.0]]);

    let stations = [
        ([51.5, -0.09], "<b>London</b>"),
        ([48.85, 2.35], "<b>Paris</b>"),
        ([-33.87, 151.21], "<b>Sydney</b>"),
    ];
    let mut markers = Vec::with_capacity(stations.len());
    for (latlng, label) in stations {
        let marker = panemap::marker(latlng, MarkerOptions::default())
            .bind_popup(label)
            .add_to(&map)?;
        markers.push(marker);
    }

    // Each marker click replaces the previous popup
    for marker in &markers {
        let icon = marker
            .element()
            .context("marker has no element after being added")?;
        dom.click_center(icon);
    }

    dom.click_center(container);
    dom.dispatch_click(container, 200.0, 150.0);

    panemap::popup()
        .set_lat_lng([0.0, 0.0])
        .set_content("Null Island")
        .open_on(&map)?;

    println!("{}", dom.to_html(container));
    println!();
    println!("markers: {}", map.markers().len());
    println!("layers: {}", map.layer_count());
    println!("popup open: {}", map.has_open_popup());
    for latlng in clicks.borrow().iter() {
        println!("click -> lat {:.3}, lng {:.3}", latlng.lat, latlng.lng);
    }

    map.close_popup();
    Ok(())
}
