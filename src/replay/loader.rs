//! Builds the collator from configured streams

use std::path::Path;

use tracing::info;

use super::symbology::{MdSymbology, Tid};
use crate::collate::{BoxedSource, Collator};
use crate::config::{ReplayConfig, StreamConfig};
use crate::error::Result;
use crate::parser::MdMessage;
use crate::source::{converter_for, open_gz_stream, MdStreamReader, Streamer};

/// Message tagged with the tid of its instrument
pub type TidMessage = MdMessage<Tid>;

/// Collator over every configured stream file
pub type TidCollator = Collator<'static, TidMessage>;

/// `{exchange}_{category}_{symbol}_{date}.md.gz`
pub fn name_for_stream(config: &StreamConfig, date: &str) -> String {
    format!(
        "{}_{}_{}_{}.md.gz",
        config.exchange,
        config.category.file_name(),
        config.symbol,
        date
    )
}

/// Open one stream file, prefetching up to `prefetch_bytes` of it
pub fn source_from_config(
    config: &StreamConfig,
    date: &str,
    data_dir: &Path,
    prefetch_bytes: usize,
    tid: Tid,
) -> Result<BoxedSource<'static, TidMessage>> {
    let path = data_dir.join(name_for_stream(config, date));
    let mut streamer = Streamer::new(open_gz_stream(&path)?);
    streamer.fetch_up_to(prefetch_bytes)?;

    info!(
        path = %path.display(),
        tid,
        category = ?config.category,
        prefetched = streamer.buffered(),
        "Opened stream file"
    );

    Ok(Box::new(MdStreamReader::new(
        streamer,
        converter_for(config.category),
        tid,
    )))
}

/// Open every configured stream, interning its instrument in `symbology`
pub fn collator_from_configs(
    configs: &[StreamConfig],
    date: &str,
    data_dir: &Path,
    prefetch_bytes: usize,
    symbology: &mut MdSymbology,
) -> Result<TidCollator> {
    let mut sources = Vec::with_capacity(configs.len());
    for config in configs {
        let tid = symbology.get_tid(&config.exchange, &config.symbol);
        sources.push(source_from_config(
            config,
            date,
            data_dir,
            prefetch_bytes,
            tid,
        )?);
    }

    Collator::new(sources)
}

/// [`collator_from_configs`] driven by a loaded [`ReplayConfig`]
pub fn collator_from_config(config: &ReplayConfig, symbology: &mut MdSymbology) -> Result<TidCollator> {
    collator_from_configs(
        &config.streams,
        &config.date,
        &config.data_dir,
        config.prefetch_bytes,
        symbology,
    )
}
