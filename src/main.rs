//! # geotag-rename CLI
//!
//! Command-line interface for the geotag renamer.
//!
//! ## Usage
//! ```bash
//! geotag-rename rename ~/Photos/Leppävaara --prefix Leppävaara
//! geotag-rename rename ~/Photos --prefix Espoo --dry-run --output json
//! ```

mod cli;

use geotag_renamer::Result;

fn main() -> Result<()> {
    cli::run()
}
