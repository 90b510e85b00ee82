//! Layer composition: overlay groups, base layers and the map session that
//! owns them.

use crate::legend::Legend;
use crate::render::{CircleMarker, MapObject};
use crate::style::{ColorBy, Rgb};

/// Independently toggleable data layers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Overlay {
    Earthquakes,
    TectonicPlates,
}

impl Overlay {
    pub const ALL: [Overlay; 2] = [Overlay::Earthquakes, Overlay::TectonicPlates];

    pub fn name(self) -> &'static str {
        match self {
            Overlay::Earthquakes => "Earthquakes",
            Overlay::TectonicPlates => "Tectonic Plates",
        }
    }

    /// Toggle key shown in the layer control
    pub fn key(self) -> char {
        match self {
            Overlay::Earthquakes => 'e',
            Overlay::TectonicPlates => 't',
        }
    }
}

/// Named collection of rendered map objects
#[derive(Clone, Debug, Default)]
pub struct LayerGroup {
    objects: Vec<MapObject>,
}

impl LayerGroup {
    pub fn extend(&mut self, objects: impl IntoIterator<Item = MapObject>) {
        self.objects.extend(objects);
    }

    pub fn objects(&self) -> &[MapObject] {
        &self.objects
    }

    pub fn get(&self, idx: usize) -> Option<&MapObject> {
        self.objects.get(idx)
    }

    /// Markers with their index in the group
    pub fn markers(&self) -> impl Iterator<Item = (usize, &CircleMarker)> {
        self.objects.iter().enumerate().filter_map(|(idx, obj)| match obj {
            MapObject::Marker(m) => Some((idx, m)),
            MapObject::Path(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Terminal colors standing in for a tile style
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BasePalette {
    pub background: Rgb,
    pub coastline: Rgb,
}

/// Mutually exclusive background map style
#[derive(Clone, Debug, PartialEq)]
pub struct BaseLayer {
    pub name: &'static str,
    pub style_id: &'static str,
    pub url_template: &'static str,
    pub attribution: &'static str,
    pub tile_size: u32,
    pub zoom_offset: i32,
    pub max_zoom: u8,
    pub palette: BasePalette,
}

const OSM_ATTRIBUTION: &str = "Map data © OpenStreetMap contributors, CC-BY-SA, Imagery © Mapbox";
const MAPBOX_ATTRIBUTION: &str = "© Mapbox © OpenStreetMap";
const STYLES_TEMPLATE: &str =
    "https://api.mapbox.com/styles/v1/{id}/tiles/{z}/{x}/{y}?access_token={accessToken}";

impl BaseLayer {
    /// Dark, Satellite, Grayscale and Outdoors, in control order
    pub fn defaults() -> Vec<BaseLayer> {
        vec![
            BaseLayer {
                name: "Dark Map",
                style_id: "dark-v10",
                url_template: "https://api.mapbox.com/styles/v1/mapbox/{id}/tiles/{z}/{x}/{y}?access_token={accessToken}",
                attribution: OSM_ATTRIBUTION,
                tile_size: 256,
                zoom_offset: 0,
                max_zoom: 18,
                palette: BasePalette {
                    background: Rgb(0x1b, 0x1b, 0x1d),
                    coastline: Rgb(0x6b, 0x6e, 0x73),
                },
            },
            BaseLayer {
                name: "Satellite Map",
                style_id: "mapbox.satellite",
                url_template: "https://api.tiles.mapbox.com/v4/{id}/{z}/{x}/{y}.png?access_token={accessToken}",
                attribution: OSM_ATTRIBUTION,
                tile_size: 256,
                zoom_offset: 0,
                max_zoom: 18,
                palette: BasePalette {
                    background: Rgb(0x0b, 0x1a, 0x2e),
                    coastline: Rgb(0x5a, 0x7d, 0x48),
                },
            },
            BaseLayer {
                name: "Grayscale Map",
                style_id: "mapbox/light-v10",
                url_template: STYLES_TEMPLATE,
                attribution: MAPBOX_ATTRIBUTION,
                tile_size: 512,
                zoom_offset: -1,
                max_zoom: 18,
                palette: BasePalette {
                    background: Rgb(0xd6, 0xd6, 0xd6),
                    coastline: Rgb(0x80, 0x80, 0x80),
                },
            },
            BaseLayer {
                name: "Outdoors Map",
                style_id: "mapbox/outdoors-v11",
                url_template: STYLES_TEMPLATE,
                attribution: MAPBOX_ATTRIBUTION,
                tile_size: 512,
                zoom_offset: -1,
                max_zoom: 18,
                palette: BasePalette {
                    background: Rgb(0xa9, 0xcf, 0xe4),
                    coastline: Rgb(0x5f, 0x8c, 0x50),
                },
            },
        ]
    }

    /// Tile URL template with style id and access token filled in; the
    /// `{z}/{x}/{y}` placeholders are left for the tile fetcher.
    pub fn tile_url(&self, access_token: &str) -> String {
        self.url_template
            .replace("{id}", self.style_id)
            .replace("{accessToken}", access_token)
    }
}

/// Initial base layer choice
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum BaseStyle {
    #[default]
    Dark,
    Satellite,
    Grayscale,
    Outdoors,
}

impl BaseStyle {
    /// Position in `BaseLayer::defaults()`
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Everything the layer selector shows: base layers (one active) and
/// overlays (any subset), always expanded.
#[derive(Clone, Debug)]
pub struct LayerControl {
    pub base_layers: Vec<BaseLayer>,
    pub overlays: Vec<Overlay>,
    pub collapsed: bool,
}

impl Default for LayerControl {
    fn default() -> Self {
        Self {
            base_layers: BaseLayer::defaults(),
            overlays: Overlay::ALL.to_vec(),
            collapsed: false,
        }
    }
}

/// Owner of all layer state for one map view
pub struct MapSession {
    earthquakes: LayerGroup,
    tectonic_plates: LayerGroup,
    control: LayerControl,
    active_base: usize,
    /// Attached overlays in attach order (draw order)
    attached: Vec<Overlay>,
    legend: Legend,
}

impl MapSession {
    /// Session with `base` active and the (empty) earthquake overlay attached
    pub fn new(base: BaseStyle, color_by: ColorBy) -> Self {
        let control = LayerControl::default();
        let active_base = base.index().min(control.base_layers.len().saturating_sub(1));
        Self {
            earthquakes: LayerGroup::default(),
            tectonic_plates: LayerGroup::default(),
            control,
            active_base,
            attached: vec![Overlay::Earthquakes],
            legend: Legend::new(color_by),
        }
    }

    pub fn group(&self, overlay: Overlay) -> &LayerGroup {
        match overlay {
            Overlay::Earthquakes => &self.earthquakes,
            Overlay::TectonicPlates => &self.tectonic_plates,
        }
    }

    fn group_mut(&mut self, overlay: Overlay) -> &mut LayerGroup {
        match overlay {
            Overlay::Earthquakes => &mut self.earthquakes,
            Overlay::TectonicPlates => &mut self.tectonic_plates,
        }
    }

    /// Add rendered objects to an overlay's group
    pub fn populate(&mut self, overlay: Overlay, objects: impl IntoIterator<Item = MapObject>) {
        self.group_mut(overlay).extend(objects);
    }

    /// Show an overlay. Attaching an attached overlay is a no-op.
    pub fn attach_overlay(&mut self, overlay: Overlay) {
        if !self.attached.contains(&overlay) {
            self.attached.push(overlay);
        }
    }

    pub fn detach_overlay(&mut self, overlay: Overlay) {
        self.attached.retain(|&o| o != overlay);
    }

    /// Flip an overlay, returning whether it is now attached
    pub fn toggle_overlay(&mut self, overlay: Overlay) -> bool {
        if self.is_attached(overlay) {
            self.detach_overlay(overlay);
            false
        } else {
            self.attach_overlay(overlay);
            true
        }
    }

    pub fn is_attached(&self, overlay: Overlay) -> bool {
        self.attached.contains(&overlay)
    }

    pub fn attached_overlays(&self) -> &[Overlay] {
        &self.attached
    }

    /// Make base layer `idx` the active one. Overlays are left alone.
    /// Returns false for an unknown index.
    pub fn select_base_layer(&mut self, idx: usize) -> bool {
        if idx < self.control.base_layers.len() {
            self.active_base = idx;
            true
        } else {
            false
        }
    }

    pub fn active_base_index(&self) -> usize {
        self.active_base
    }

    pub fn active_base_layer(&self) -> &BaseLayer {
        &self.control.base_layers[self.active_base]
    }

    pub fn control(&self) -> &LayerControl {
        &self.control
    }

    pub fn legend(&self) -> &Legend {
        &self.legend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{PathObject, Popup};
    use crate::style::{MarkerStyle, PathStyle};

    fn marker() -> MapObject {
        MapObject::Marker(CircleMarker {
            lon: 0.0,
            lat: 0.0,
            style: MarkerStyle::for_quake(3.0, 3.0),
            popup: Popup {
                location: "here".into(),
                date: "now".into(),
                magnitude: "3".into(),
            },
        })
    }

    #[test]
    fn test_initial_state() {
        let session = MapSession::new(BaseStyle::Dark, ColorBy::Magnitude);
        assert_eq!(session.active_base_layer().name, "Dark Map");
        assert_eq!(session.attached_overlays(), &[Overlay::Earthquakes]);
        assert!(session.group(Overlay::Earthquakes).is_empty());
        assert!(session.group(Overlay::TectonicPlates).is_empty());
        assert!(!session.control().collapsed);
        assert_eq!(session.legend().entries.len(), 6);
    }

    #[test]
    fn test_attach_is_idempotent() {
        let mut session = MapSession::new(BaseStyle::Dark, ColorBy::Magnitude);
        session.attach_overlay(Overlay::TectonicPlates);
        session.attach_overlay(Overlay::TectonicPlates);
        session.attach_overlay(Overlay::Earthquakes);
        assert_eq!(
            session.attached_overlays(),
            &[Overlay::Earthquakes, Overlay::TectonicPlates]
        );
    }

    #[test]
    fn test_base_layer_switch_keeps_overlays() {
        let mut session = MapSession::new(BaseStyle::Dark, ColorBy::Magnitude);
        session.attach_overlay(Overlay::TectonicPlates);

        for idx in [1, 2, 3, 0] {
            assert!(session.select_base_layer(idx));
            assert_eq!(session.active_base_index(), idx);
            assert!(session.is_attached(Overlay::Earthquakes));
            assert!(session.is_attached(Overlay::TectonicPlates));
        }
        assert!(!session.select_base_layer(4));
        assert_eq!(session.active_base_index(), 0);
    }

    #[test]
    fn test_toggle_keeps_group_contents() {
        let mut session = MapSession::new(BaseStyle::Satellite, ColorBy::Magnitude);
        session.populate(Overlay::Earthquakes, [marker(), marker()]);

        assert!(!session.toggle_overlay(Overlay::Earthquakes));
        assert!(session.attached_overlays().is_empty());
        assert_eq!(session.group(Overlay::Earthquakes).len(), 2);

        assert!(session.toggle_overlay(Overlay::Earthquakes));
        assert_eq!(session.group(Overlay::Earthquakes).markers().count(), 2);
    }

    #[test]
    fn test_markers_skip_paths() {
        let mut group = LayerGroup::default();
        group.extend([
            MapObject::Path(PathObject {
                lines: vec![],
                style: PathStyle::plate_boundary(),
            }),
            marker(),
        ]);
        let indices: Vec<_> = group.markers().map(|(idx, _)| idx).collect();
        assert_eq!(indices, [1]);
        assert!(group.get(0).is_some());
        assert_eq!(group.objects().len(), 2);
    }

    #[test]
    fn test_tile_urls() {
        let layers = BaseLayer::defaults();
        assert_eq!(layers.len(), 4);
        assert_eq!(
            layers[0].tile_url("tok"),
            "https://api.mapbox.com/styles/v1/mapbox/dark-v10/tiles/{z}/{x}/{y}?access_token=tok"
        );
        assert_eq!(
            layers[1].tile_url("tok"),
            "https://api.tiles.mapbox.com/v4/mapbox.satellite/{z}/{x}/{y}.png?access_token=tok"
        );
        assert_eq!(BaseStyle::Outdoors.index(), 3);
        assert_eq!(layers[BaseStyle::Outdoors.index()].style_id, "mapbox/outdoors-v11");
    }
}
