//! Cutting two document sides into index-aligned units.

use pagediff_types::{DocumentPair, LineSequence, SideContent, Unit, UnitLayout};

use crate::error::{EngineError, EngineResult};

/// Units of one document plus how they were laid out.
#[derive(Clone, Debug)]
pub struct Segmentation {
    pub units: Vec<Unit>,
    pub layout: UnitLayout,
}

fn to_u32(n: usize, what: &str) -> EngineResult<u32> {
    u32::try_from(n).map_err(|_| EngineError::invalid_config(format!("too many {what}: {n}")))
}

/// Fixed-size segmentation: unit `i` takes lines `[i*L, i*L + L)` of each
/// side, clamped. A side that runs out early contributes empty slices.
pub fn segment_fixed(
    dev: &LineSequence,
    prod: &LineSequence,
    unit_lines: usize,
) -> EngineResult<Segmentation> {
    if unit_lines == 0 {
        return Err(EngineError::invalid_config("unit size must be at least 1 line"));
    }
    let dev_units = dev.len().div_ceil(unit_lines);
    let prod_units = prod.len().div_ceil(unit_lines);
    let count = dev_units.max(prod_units);

    let mut units = Vec::with_capacity(count);
    for i in 0..count {
        let start = i * unit_lines;
        let range = start..start + unit_lines;
        units.push(Unit::new(
            to_u32(i, "units")?,
            dev.slice_clamped(range.clone()),
            prod.slice_clamped(range),
        ));
    }

    Ok(Segmentation {
        layout: UnitLayout {
            units: to_u32(count, "units")?,
            dev_units: to_u32(dev_units, "units")?,
            prod_units: to_u32(prod_units, "units")?,
            dev_lines: dev.len() as u64,
            prod_lines: prod.len() as u64,
        },
        units,
    })
}

/// Page-aligned segmentation: unit `i` pairs dev page `i` with prod page `i`,
/// either of which may be missing and is then empty.
pub fn segment_pages(dev: &[LineSequence], prod: &[LineSequence]) -> EngineResult<Segmentation> {
    let count = dev.len().max(prod.len());
    let page = |pages: &[LineSequence], i: usize| {
        pages
            .get(i)
            .map(LineSequence::full)
            .unwrap_or_default()
    };

    let mut units = Vec::with_capacity(count);
    for i in 0..count {
        units.push(Unit::new(to_u32(i, "pages")?, page(dev, i), page(prod, i)));
    }

    let lines = |pages: &[LineSequence]| pages.iter().map(|p| p.len() as u64).sum();
    Ok(Segmentation {
        layout: UnitLayout {
            units: to_u32(count, "pages")?,
            dev_units: to_u32(dev.len(), "pages")?,
            prod_units: to_u32(prod.len(), "pages")?,
            dev_lines: lines(dev),
            prod_lines: lines(prod),
        },
        units,
    })
}

/// Segment a pair, following natural pages when the sides declare them.
///
/// Pages are used when at least one side is paginated and any unpaginated
/// side is empty (typically because it could not be extracted). Otherwise
/// the whole pair is cut into fixed-size units of `unit_lines` lines.
/// Per-side unit counts follow [`SideContent::page_count`], so pages added
/// only to align the two sides are not counted.
pub fn segment(pair: &DocumentPair, unit_lines: usize) -> EngineResult<Segmentation> {
    let pages_or_empty = |side: &SideContent| match &side.pages {
        Some(pages) => Some(pages.clone()),
        None if side.lines.is_empty() => Some(Vec::new()),
        None => None,
    };
    if pair.dev.pages.is_some() || pair.prod.pages.is_some() {
        if let (Some(dev), Some(prod)) = (pages_or_empty(&pair.dev), pages_or_empty(&pair.prod)) {
            let mut segmentation = segment_pages(&dev, &prod)?;
            segmentation.layout.dev_units = to_u32(pair.dev.page_count().unwrap_or(0), "pages")?;
            segmentation.layout.prod_units =
                to_u32(pair.prod.page_count().unwrap_or(0), "pages")?;
            return Ok(segmentation);
        }
    }
    segment_fixed(&pair.dev.lines, &pair.prod.lines, unit_lines)
}
