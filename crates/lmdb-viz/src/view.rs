//! View parameters owned by a front end.
//!
//! A [`ViewState`] is a plain value: the front end mutates it in response to
//! input and passes it to [`crate::binner::render`] whenever it changed.

use bitflags::bitflags;

use crate::config::ViewDefaults;
use crate::extent::RecordKind;

pub const MIN_MAGNIFICATION: u32 = 1;
pub const MAX_MAGNIFICATION: u32 = 16;
pub const MIN_ZOOM: f64 = 0.0001;

/// Fraction of the visible window moved by one pan step at zoom 1.
const PAN_STEP: f64 = 0.1;

bitflags! {
    /// Record kinds shown for one table.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct KindMask: u8 {
        const KEY = 0b01;
        const VALUE = 0b10;
    }
}

impl KindMask {
    pub fn for_kind(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Key => Self::KEY,
            RecordKind::Value => Self::VALUE,
        }
    }
}

/// Per-table visibility of keys and values.
///
/// Tables without an entry are visible.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Visibility {
    masks: Vec<KindMask>,
}

impl Visibility {
    /// Everything visible for `tables` tables.
    pub fn all_visible(tables: usize) -> Self {
        Self {
            masks: vec![KindMask::all(); tables],
        }
    }

    pub fn is_visible(&self, table_id: u16, kind: RecordKind) -> bool {
        self.mask(table_id).contains(KindMask::for_kind(kind))
    }

    pub fn mask(&self, table_id: u16) -> KindMask {
        self.masks
            .get(usize::from(table_id))
            .copied()
            .unwrap_or(KindMask::all())
    }

    pub fn set(&mut self, table_id: u16, kind: RecordKind, visible: bool) {
        let index = usize::from(table_id);
        if index >= self.masks.len() {
            self.masks.resize(index + 1, KindMask::all());
        }
        self.masks[index].set(KindMask::for_kind(kind), visible);
    }

    /// Flips one flag, returning the new visibility.
    pub fn toggle(&mut self, table_id: u16, kind: RecordKind) -> bool {
        let visible = !self.is_visible(table_id, kind);
        self.set(table_id, kind, visible);
        visible
    }

    pub fn hide_table(&mut self, table_id: u16) {
        self.set(table_id, RecordKind::Key, false);
        self.set(table_id, RecordKind::Value, false);
    }

    pub fn hide_all(&mut self) {
        self.masks.fill(KindMask::empty());
    }

    pub fn show_all(&mut self) {
        self.masks.fill(KindMask::all());
    }

    pub fn show_keys(&mut self) {
        for mask in &mut self.masks {
            mask.insert(KindMask::KEY);
        }
    }

    pub fn show_values(&mut self) {
        for mask in &mut self.masks {
            mask.insert(KindMask::VALUE);
        }
    }
}

/// Pan, zoom, magnification and visibility of the rendered map.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    /// Fraction of the span skipped before the visible window, in `[0, 1]`.
    pub skip: f64,
    /// Divides the bytes represented per cell; larger shows less.
    pub zoom: f64,
    /// Output pixels per logical cell along each axis.
    pub magnification: u32,
    pub visibility: Visibility,
    defaults: ViewDefaults,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::with_defaults(ViewDefaults::default(), 0)
    }
}

impl ViewState {
    /// View over `tables` tables using the built-in defaults.
    pub fn new(tables: usize) -> Self {
        Self::with_defaults(ViewDefaults::default(), tables)
    }

    /// View starting from (and resetting to) `defaults`.
    pub fn with_defaults(defaults: ViewDefaults, tables: usize) -> Self {
        Self {
            skip: defaults.skip,
            zoom: defaults.zoom,
            magnification: defaults.magnification,
            visibility: Visibility::all_visible(tables),
            defaults,
        }
        .clamped()
    }

    /// Copy with every parameter forced into its valid range.
    ///
    /// Non-finite values fall back to the defaults.
    pub fn clamped(mut self) -> Self {
        self.magnification = clamp_magnification(self.magnification);
        self.skip = if self.skip.is_nan() {
            self.defaults.skip
        } else {
            self.skip
        }
        .clamp(0.0, 1.0);
        self.zoom = if self.zoom.is_nan() {
            self.defaults.zoom
        } else {
            self.zoom
        }
        .max(MIN_ZOOM);
        self
    }

    pub fn magnify_in(&mut self) {
        self.magnification = clamp_magnification(self.magnification.saturating_mul(2));
    }

    pub fn magnify_out(&mut self) {
        self.magnification = clamp_magnification(self.magnification / 2);
    }

    /// Moves the window towards the start of the map.
    pub fn pan_up(&mut self) {
        self.skip = (self.skip - self.pan_step()).clamp(0.0, 1.0);
    }

    /// Moves the window towards the end of the map.
    pub fn pan_down(&mut self) {
        self.skip = (self.skip + self.pan_step()).clamp(0.0, 1.0);
    }

    pub fn zoom_in(&mut self) {
        self.zoom *= 2.0;
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 2.0).max(MIN_ZOOM);
    }

    /// Restores the initial parameters and shows every table.
    pub fn reset(&mut self) {
        self.skip = self.defaults.skip;
        self.zoom = self.defaults.zoom;
        self.magnification = clamp_magnification(self.defaults.magnification);
        self.visibility.show_all();
    }

    fn pan_step(&self) -> f64 {
        1.0 / self.zoom.max(MIN_ZOOM) * PAN_STEP
    }
}

fn clamp_magnification(magnification: u32) -> u32 {
    magnification.clamp(MIN_MAGNIFICATION, MAX_MAGNIFICATION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_view() {
        let view = ViewState::new(3);
        assert_eq!(view.magnification, 8);
        assert_eq!(view.skip, 0.0);
        assert_eq!(view.zoom, 1.0);
        for id in 0..3 {
            assert!(view.visibility.is_visible(id, RecordKind::Key));
            assert!(view.visibility.is_visible(id, RecordKind::Value));
        }
    }

    #[test]
    fn test_magnification_steps_and_bounds() {
        let mut view = ViewState::new(0);
        view.magnify_in();
        assert_eq!(view.magnification, 16);
        view.magnify_in();
        assert_eq!(view.magnification, 16);

        for _ in 0..10 {
            view.magnify_out();
        }
        assert_eq!(view.magnification, 1);
    }

    #[test]
    fn test_pan_scales_with_zoom_and_clamps() {
        let mut view = ViewState::new(0);
        view.pan_down();
        assert!((view.skip - 0.1).abs() < 1e-12);

        view.zoom_in();
        view.pan_down();
        assert!((view.skip - 0.15).abs() < 1e-12);

        view.pan_up();
        view.pan_up();
        view.pan_up();
        assert!(view.skip.abs() < 1e-12);
        view.pan_up();
        assert_eq!(view.skip, 0.0);

        view.zoom = 0.01;
        view.pan_down();
        assert_eq!(view.skip, 1.0);
    }

    #[test]
    fn test_zoom_out_floor() {
        let mut view = ViewState::new(0);
        for _ in 0..40 {
            view.zoom_out();
        }
        assert_eq!(view.zoom, MIN_ZOOM);
    }

    #[test]
    fn test_clamped_handles_pathological_input() {
        let view = ViewState {
            skip: f64::NAN,
            zoom: -3.0,
            magnification: 0,
            ..ViewState::new(0)
        }
        .clamped();
        assert_eq!(view.skip, 0.0);
        assert_eq!(view.zoom, MIN_ZOOM);
        assert_eq!(view.magnification, 1);

        let view = ViewState {
            skip: 7.0,
            zoom: f64::NAN,
            magnification: 1000,
            ..ViewState::new(0)
        }
        .clamped();
        assert_eq!(view.skip, 1.0);
        assert_eq!(view.zoom, 1.0);
        assert_eq!(view.magnification, 16);
    }

    #[test]
    fn test_reset_restores_defaults_and_visibility() {
        let defaults = ViewDefaults {
            magnification: 4,
            skip: 0.25,
            zoom: 2.0,
        };
        let mut view = ViewState::with_defaults(defaults, 2);
        view.magnify_in();
        view.zoom_in();
        view.pan_down();
        view.visibility.hide_all();

        view.reset();
        assert_eq!(view.magnification, 4);
        assert_eq!(view.skip, 0.25);
        assert_eq!(view.zoom, 2.0);
        assert!(view.visibility.is_visible(1, RecordKind::Value));
    }

    #[test]
    fn test_visibility_bulk_operations() {
        let mut visibility = Visibility::all_visible(2);
        visibility.hide_all();
        assert!(!visibility.is_visible(0, RecordKind::Key));
        assert!(!visibility.is_visible(1, RecordKind::Value));

        visibility.show_keys();
        assert!(visibility.is_visible(0, RecordKind::Key));
        assert!(!visibility.is_visible(0, RecordKind::Value));

        visibility.show_values();
        assert_eq!(visibility.mask(1), KindMask::all());

        visibility.hide_table(1);
        assert_eq!(visibility.mask(1), KindMask::empty());
        assert_eq!(visibility.mask(0), KindMask::all());
    }

    #[test]
    fn test_toggle_and_unknown_tables() {
        let mut visibility = Visibility::all_visible(1);
        assert!(visibility.is_visible(9, RecordKind::Key));

        assert!(!visibility.toggle(0, RecordKind::Value));
        assert!(!visibility.is_visible(0, RecordKind::Value));
        assert!(visibility.is_visible(0, RecordKind::Key));
        assert!(visibility.toggle(0, RecordKind::Value));

        visibility.set(5, RecordKind::Key, false);
        assert!(!visibility.is_visible(5, RecordKind::Key));
        assert!(visibility.is_visible(4, RecordKind::Key));
    }
}
