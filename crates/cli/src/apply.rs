//! Offline filter application: caption + local file(s) in, filtered PNG out.

use std::path::{Path, PathBuf};

use {
    anyhow::Context,
    pixbot_dispatch::{Command, parse_caption},
    pixbot_media::{Image, codec},
    tracing::info,
};

fn load(path: &Path) -> anyhow::Result<Image> {
    let data = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image")
        .to_string();
    Image::decode(id, &data).with_context(|| format!("failed to decode {}", path.display()))
}

/// Apply `caption` to `image` (joined with `second` for concat) and write the
/// result to `output`, or next to `image` as `<stem>_filtered.png`.
pub fn run(
    caption: &str,
    image: &Path,
    second: Option<&Path>,
    output: Option<PathBuf>,
) -> anyhow::Result<PathBuf> {
    let command = parse_caption(caption, second.is_some())?
        .ok_or(pixbot_dispatch::Error::MissingAction)?;

    let mut picture = load(image)?;
    match (&command, second) {
        (Command::Concat(spec), Some(second)) => {
            let peer = load(second)?;
            picture.concat(&peer, spec.layout()?)?;
        },
        (_, Some(second)) => {
            info!(ignored = %second.display(), "second image only applies to concat");
            command.apply(&mut picture)?;
        },
        (_, None) => command.apply(&mut picture)?,
    }

    let out = output.unwrap_or_else(|| codec::filtered_path(image));
    let png = picture.encode_png()?;
    std::fs::write(&out, png).with_context(|| format!("failed to write {}", out.display()))?;
    info!(action = ?command.action(), path = %out.display(), "wrote filtered image");
    Ok(out)
}
