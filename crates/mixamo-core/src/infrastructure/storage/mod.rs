mod placement;

pub use placement::place;
