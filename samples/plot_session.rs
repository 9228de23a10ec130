//! Align two series from a directory of blobs using postal_session.
use std::sync::Arc;

use postal_session::{DatasetMetadata, Session, SessionConfig};
use postal_source::DirSource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let meta = DatasetMetadata::from_json(r#"{"valid_map": {"(.*)\\.lat": "$1.fix"}}"#)?;
    let source = DirSource::new("/var/lib/postal/run-42");
    let mut session = Session::new(SessionConfig::default(), Arc::new(source)).with_validity(meta.validity);
    session.add_series("gps.lat").await?;
    session.add_series("baro.alt").await?;
    for row in session.filtered_table().rows() {
        println!("{} {:?}", row.timestamp, row.values);
    }
    Ok(())
}
