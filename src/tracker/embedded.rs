use rust_embed::RustEmbed;

/// Browser UI bundle compiled into the binary.
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/static/"]
pub struct Assets;
