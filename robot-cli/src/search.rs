//! Streaming search executor and the `search` verb

use crate::store::{RemoteStore, Visit};
use robot_common::models::{Artifact, Domain, Entity, Package, StashEntry, Track};
use robot_common::text::to_text;
use robot_common::{compile_query, Error, Query, Result};
use serde_json::Value;
use std::io::Write;
use tracing::debug;

/// Stream every `T` matching `query` to `visitor`
///
/// The visitor sees entities one at a time, in server order, and may end the
/// stream early with [`Visit::Stop`]; that error is what this returns. An
/// entity the client cannot decode also stops the stream.
pub async fn search<T, F>(store: &dyn RemoteStore, query: &Query, mut visitor: F) -> Result<()>
where
    T: Entity,
    F: FnMut(T) -> Visit + Send,
{
    let mut decode = |value: Value| match serde_json::from_value::<T>(value) {
        Ok(entity) => visitor(entity),
        Err(err) => Visit::Stop(Error::from(err)),
    };
    store.search(T::DOMAIN, query, &mut decode).await
}

/// Compile `words` as search text and print every match to `out`
///
/// Nothing is sent to the store when the text does not compile. Records are
/// separated by a blank line. Returns the number of records printed.
pub async fn run_search(
    store: &dyn RemoteStore,
    domain: Domain,
    words: &[String],
    out: &mut (dyn Write + Send),
) -> Result<usize> {
    let text = words.join(" ");
    let query = compile_query(&text)?;
    debug!("Searching {} with {:?}", domain.collection(), text);

    match domain {
        Domain::Artifact => print_matches::<Artifact>(store, &query, out).await,
        Domain::Package => print_matches::<Package>(store, &query, out).await,
        Domain::Track => print_matches::<Track>(store, &query, out).await,
        Domain::Stash => print_matches::<StashEntry>(store, &query, out).await,
    }
}

async fn print_matches<T: Entity>(
    store: &dyn RemoteStore,
    query: &Query,
    out: &mut (dyn Write + Send),
) -> Result<usize> {
    let mut count = 0;
    search::<T, _>(store, query, |entity| match write_record(out, count, &entity) {
        Ok(()) => {
            count += 1;
            Visit::Continue
        }
        Err(err) => Visit::Stop(err),
    })
    .await?;
    Ok(count)
}

fn write_record<T: Entity>(out: &mut (dyn Write + Send), index: usize, entity: &T) -> Result<()> {
    if index > 0 {
        out.write_all(b"\n")?;
    }
    out.write_all(to_text(entity)?.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn track(id: &str, name: &str) -> Track {
        Track {
            id: id.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_search_decodes_entities() {
        let store = MemoryStore::new();
        store.insert_track(track("t1", "alpha"));

        let mut names = Vec::new();
        search::<Track, _>(&store, &Query::all(), |t| {
            names.push(t.name);
            Visit::Continue
        })
        .await
        .unwrap();
        assert_eq!(names, vec!["alpha"]);
    }

    #[tokio::test]
    async fn test_run_search_separates_records() {
        let store = MemoryStore::new();
        store.insert_track(track("t1", "alpha"));
        store.insert_track(track("t2", "beta"));

        let mut out = Vec::new();
        let count = run_search(&store, Domain::Track, &[], &mut out).await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "id: \"t1\"\nname: \"alpha\"\n\nid: \"t2\"\nname: \"beta\"\n"
        );
    }

    #[tokio::test]
    async fn test_run_search_joins_words() {
        let store = MemoryStore::new();
        store.insert_track(track("t1", "alpha"));
        store.insert_track(track("t2", "beta"));

        let words: Vec<String> = ["name", "==", "\"beta\""].iter().map(|w| w.to_string()).collect();
        let mut out = Vec::new();
        let count = run_search(&store, Domain::Track, &words, &mut out).await.unwrap();
        assert_eq!(count, 1);
    }
}
