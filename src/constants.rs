// src/constants.rs
//
// Package format constants and model defaults.
// Defaults are owned here so the generator does not depend on any external
// Anki library for them.

/// Font assigned to a field when the request does not name one.
pub const DEFAULT_FIELD_FONT: &str = "Liberation Sans";

/// Font size assigned to a field when the request does not name one.
pub const DEFAULT_FIELD_SIZE: u32 = 20;

/// Stylesheet assigned to a model when the request does not provide one.
pub const DEFAULT_MODEL_CSS: &str = ".card {
    font-family: arial;
    font-size: 20px;
    text-align: center;
    color: black;
    background-color: white;
}";

/// LaTeX preamble prepended to every LaTeX snippet rendered by Anki.
pub const DEFAULT_LATEX_PRE: &str = "\\documentclass[12pt]{article}\n\
\\special{papersize=3in,5in}\n\
\\usepackage[utf8]{inputenc}\n\
\\usepackage{amssymb,amsmath}\n\
\\pagestyle{empty}\n\
\\setlength{\\parindent}{0in}\n\
\\begin{document}\n";

/// LaTeX postamble appended to every LaTeX snippet rendered by Anki.
pub const DEFAULT_LATEX_POST: &str = "\\end{document}";

/// Id of the deck every Anki collection carries.
pub const DEFAULT_DECK_ID: i64 = 1;

/// Archive member holding the SQLite collection.
pub const COLLECTION_ENTRY_NAME: &str = "collection.anki2";

/// Archive member holding the media manifest (index -> filename JSON).
pub const MEDIA_ENTRY_NAME: &str = "media";

/// Content type the transport layer should announce for a package.
pub const PACKAGE_CONTENT_TYPE: &str = "application/octet-stream";

/// Chunk size used when streaming a finished package.
///
/// Used in: `infrastructure/artifact.rs`, `infrastructure/config.rs`
pub const DEFAULT_STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Prefix for scratch directories and reserved artifact names.
///
/// Used in: `infrastructure/scratch.rs`, `infrastructure/config.rs`
pub const DEFAULT_SCRATCH_PREFIX: &str = "ankipack-";

/// Separator between field values in the `notes.flds` column.
pub const FIELD_SEPARATOR: char = '\x1f';

/// Alphabet Anki uses to render note guids.
pub const BASE91_TABLE: &[u8; 91] = b"abcdefghijklmnopqrstuvwxyz\
ABCDEFGHIJKLMNOPQRSTUVWXYZ\
0123456789\
!#$%&()*+,-./:;<=>?@[]^_`{|}~";
