// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parser for the amplifier's `status.xml` document.
//!
//! The document carries one `power` element for the whole unit and one
//! element per zone whose tag starts with `zone` (`zone1`, `zone2`, ...).
//! Nesting is not significant; only leaf elements are considered, and a
//! `<zones>` wrapper never counts as a zone, even when it is empty.
//!
//! ```text
//! <response>
//!   <power>1</power>
//!   <zone1>0</zone1>
//!   <zone2>1</zone2>
//! </response>
//! ```

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::state::ZoneList;
use crate::types::ZoneState;

const MAIN_POWER_TAG: &str = "power";
const ZONE_TAG_PREFIX: &str = "zone";
const ZONES_WRAPPER_TAG: &str = "zones";

/// An element whose end tag has not been read yet.
#[derive(Debug)]
struct OpenElement {
    name: String,
    text: String,
    has_children: bool,
}

/// Values collected while walking the document.
#[derive(Debug, Default)]
struct StatusValues {
    main_power: Option<ZoneState>,
    zones: Vec<ZoneState>,
}

impl StatusValues {
    fn record(&mut self, name: &str, text: &str, zone_count: usize) {
        if name == MAIN_POWER_TAG {
            if self.main_power.is_none() {
                self.main_power = Some(ZoneState::from_text(text));
            }
        } else if name.starts_with(ZONE_TAG_PREFIX)
            && name != ZONES_WRAPPER_TAG
            && self.zones.len() < zone_count
        {
            self.zones.push(ZoneState::from_text(text));
        }
    }
}

/// Parses a status document into a [`ZoneList`].
///
/// Zone elements are numbered in document order starting at 1 and anything
/// beyond `zone_count` is ignored. Only the first `power` element is used.
/// A value that is not an integer yields [`ZoneState::Unknown`] for that
/// zone alone.
///
/// # Errors
///
/// Returns `quick_xml::Error` if the document is not well-formed.
///
/// # Examples
///
/// ```
/// use powerplant_bridge::device::parse_status;
/// use powerplant_bridge::types::{ZoneId, ZoneState};
///
/// let xml = "<response><power>1</power><zone1>0</zone1><zone2>x</zone2></response>";
/// let zones = parse_status(xml, 2).unwrap();
///
/// assert_eq!(zones.state(ZoneId::MAIN), Some(ZoneState::On));
/// assert_eq!(zones.state(ZoneId::new(1)), Some(ZoneState::Off));
/// assert_eq!(zones.state(ZoneId::new(2)), Some(ZoneState::Unknown));
/// ```
pub fn parse_status(xml: &str, zone_count: usize) -> Result<ZoneList, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut open: Vec<OpenElement> = Vec::new();
    let mut values = StatusValues::default();

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                if let Some(parent) = open.last_mut() {
                    parent.has_children = true;
                }
                open.push(OpenElement {
                    name: local_name(e),
                    text: String::new(),
                    has_children: false,
                });
            }
            Event::Empty(ref e) => {
                if let Some(parent) = open.last_mut() {
                    parent.has_children = true;
                }
                values.record(&local_name(e), "", zone_count);
            }
            Event::Text(ref e) => {
                if let Some(element) = open.last_mut() {
                    element.text.push_str(&e.unescape()?);
                }
            }
            Event::CData(ref e) => {
                if let Some(element) = open.last_mut() {
                    element.text.push_str(&String::from_utf8_lossy(e));
                }
            }
            Event::End(_) => {
                if let Some(element) = open.pop()
                    && !element.has_children
                {
                    values.record(&element.name, &element.text, zone_count);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(ZoneList::from_states(values.main_power, values.zones))
}

fn local_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}
