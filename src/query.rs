//! Query pipeline: resolve → count → paginate → render.

use crate::data::filter::{Query1D, Query3D};
use crate::data::page::paginate;
use crate::data::store::RecordStore;
use crate::error::QueryError;
use crate::format::{delimited, velest, HeaderStyle, Title};

fn title<S: RecordStore + ?Sized>(
    store: &S,
    style: HeaderStyle,
    prefix: &'static str,
    author: &str,
    nfo: &str,
    stored_nfo: Option<&str>,
) -> Result<Title, QueryError> {
    Ok(match style {
        HeaderStyle::Request => Title::Request {
            author: author.to_string(),
            nfo: nfo.to_string(),
        },
        HeaderStyle::Reference => Title::Reference {
            prefix,
            nfo: stored_nfo.unwrap_or("Unknown").to_string(),
            bibref: store.bibref(author)?,
        },
    })
}

/// Answer a 1D query with a VELEST body.
pub fn query_1d<S: RecordStore + ?Sized>(
    store: &S,
    request: &Query1D,
    style: HeaderStyle,
) -> Result<String, QueryError> {
    let resolved = request.resolve()?;
    let total = store.count_1d(&resolved.filter)?;
    let page = paginate(
        total,
        resolved.window,
        || QueryError::NoData1D {
            author: request.author.clone(),
            nfo: request.nfo.clone(),
        },
        |window| store.fetch_1d(&resolved.filter, window),
    )?;

    let stored_nfo = page.rows.first().map(|r| r.nfo.as_str());
    let title = title(store, style, "1D", &request.author, &request.nfo, stored_nfo)?;
    Ok(velest::render(&title, &page))
}

/// Answer a 3D query with a delimited body.
pub fn query_3d<S: RecordStore + ?Sized>(
    store: &S,
    request: &Query3D,
    style: HeaderStyle,
) -> Result<String, QueryError> {
    let resolved = request.resolve()?;
    let total = store.count_3d(resolved.wave_type, &resolved.filter)?;
    let page = paginate(
        total,
        resolved.window,
        || QueryError::NoData3D {
            wave_type: resolved.wave_type,
            author: request.author.clone(),
            nfo: request.nfo.clone(),
        },
        |window| store.fetch_3d(resolved.wave_type, &resolved.filter, window),
    )?;

    let stored_nfo = page.rows.first().map(|r| r.nfo.as_str());
    let title = title(store, style, "3D", &request.author, &request.nfo, stored_nfo)?;
    Ok(delimited::render(
        &title,
        resolved.wave_type,
        resolved.include_r,
        &page,
    ))
}
