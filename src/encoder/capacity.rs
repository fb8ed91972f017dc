// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Image span against tag capacity.

use crate::core::error::{Diagnostic, DiagnosticKind};
use crate::core::tag::{format_addr, TagType, IMAGE_START};

use super::Image;

/// Report an image that does not fit the tag. The image itself is left alone.
pub fn check(image: &Image, tag_type: TagType) -> Option<Diagnostic> {
    let span = image.len();
    let capacity = tag_type.capacity() as usize;
    if span <= capacity {
        return None;
    }
    Some(
        Diagnostic::new(
            DiagnosticKind::Capacity,
            format!(
                "Selected fields require {span} bytes from {}, which exceeds {tag_type} capacity of {capacity}",
                format_addr(IMAGE_START)
            ),
        )
        .with_address(image.highest()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_of(len: usize) -> Image {
        Image {
            bytes: vec![0; len],
            highest: IMAGE_START + len as u32 - 1,
        }
    }

    #[test]
    fn fits_exactly() {
        assert!(check(&image_of(144), TagType::Ntag213).is_none());
        assert!(check(&image_of(0), TagType::Ntag213).is_none());
    }

    #[test]
    fn oversize_is_reported_with_numbers() {
        let diag = check(&image_of(187), TagType::Ntag213).expect("diagnostic");
        assert_eq!(diag.kind(), DiagnosticKind::Capacity);
        assert_eq!(
            diag.message(),
            "Selected fields require 187 bytes from 0x10, which exceeds NTAG213 capacity of 144"
        );
        assert_eq!(diag.address(), Some(0xCA));
        assert!(check(&image_of(187), TagType::Ntag215).is_none());
    }
}
