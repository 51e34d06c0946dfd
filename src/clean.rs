use std::path::Path;

use multinet_core::export::{read_network, write_network};
use multinet_core::model::parse_mode_list;
use multinet_core::{Error, Mode, NetworkCleaner};

/// Cleans either one mode against a retained set, or an ordered list of
/// modes where later modes stay protected while earlier ones are cleaned
pub fn run(
    input: &Path,
    output: &Path,
    mode: Option<Mode>,
    retain: &str,
    modes: Option<&str>,
) -> Result<(), Error> {
    let retained = parse_mode_list(retain)?;
    if let Some(mode) = mode.filter(|mode| retained.contains(mode)) {
        return Err(Error::InvalidConfig(format!(
            "Mode {mode} is retained and would not be cleaned, drop it from --retain"
        )));
    }

    let mut cleaner = NetworkCleaner::new(read_network(input)?);

    let report = match (mode, modes) {
        (Some(mode), _) => cleaner.clean_mode(mode, &retained),
        (None, Some(modes)) => cleaner.clean_modes(&parse_mode_list(modes)?),
        (None, None) => {
            return Err(Error::InvalidConfig(
                "Either a mode or a mode list is required".to_string(),
            ));
        }
    };
    tracing::info!(
        "Removed {} links and {} nodes, stripped modes from {} links",
        report.removed_links,
        report.removed_nodes,
        report.stripped_links
    );

    write_network(&cleaner.into_network(), None, output)
}
