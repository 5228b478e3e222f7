use arrayview_canvas::layout::ElementKind;
use arrayview_canvas::{
    array_from_image, array_view_from_image, bytes_from_image, image_from_array, Image,
    ImportOptions, PixelId, ViewOptions,
};
use proptest::prelude::*;

/// A pixel type with an array element, and a fitting number of components.
fn pixel_and_components() -> impl Strategy<Value = (PixelId, usize)> {
    let element = prop::sample::select(ElementKind::ALL.to_vec());
    (element, any::<bool>(), 2usize..5).prop_map(|(element, vector, components)| {
        let pixel = PixelId::from_element(element, vector);
        (pixel, if vector { components } else { 1 })
    })
}

fn filled_image(pixel: PixelId, components: usize, size: &[usize], seed: u8) -> Image {
    let image = Image::with_components(size, pixel, components).unwrap();
    let bytes: Vec<u8> = (0..image.buffer_byte_len())
        .map(|idx| (idx as u8).wrapping_mul(31).wrapping_add(seed))
        .collect();
    image.lifetime_owner().write_bytes(0, &bytes).unwrap();
    image
}

proptest! {
    #[test]
    fn shared_round_trip(
        (pixel, components) in pixel_and_components(),
        size in prop::collection::vec(1usize..6, 2..4),
        seed in any::<u8>(),
    ) {
        let image = filled_image(pixel, components, &size, seed);
        let view = array_view_from_image(&image, ViewOptions::default().writable()).unwrap();

        let mut shape: Vec<usize> = size.iter().rev().copied().collect();
        if components > 1 {
            shape.push(components);
        }
        prop_assert_eq!(view.shape(), &shape[..]);
        prop_assert_eq!(view.address(), image.buffer_address());
        prop_assert_eq!(view.to_bytes(), image.to_bytes());

        let back = image_from_array(&view, ImportOptions::default()).unwrap();
        prop_assert_eq!(back.pixel_id(), pixel);
        prop_assert_eq!(back.size(), &size[..]);
        prop_assert_eq!(back.components_per_pixel(), components);
        prop_assert_eq!(back.buffer_address(), image.buffer_address());
        prop_assert_eq!(back.content_hash(), image.content_hash());
    }

    #[test]
    fn copies_do_not_alias(
        (pixel, components) in pixel_and_components(),
        size in prop::collection::vec(1usize..6, 2..4),
        seed in any::<u8>(),
    ) {
        let image = filled_image(pixel, components, &size, seed);
        let before = bytes_from_image(&image).unwrap();
        let copy = array_from_image(&image).unwrap();
        prop_assert_eq!(copy.to_bytes(), before.clone());

        let inverted: Vec<u8> = before.iter().map(|byte| !byte).collect();
        image.lifetime_owner().write_bytes(0, &inverted).unwrap();
        prop_assert_eq!(copy.to_bytes(), before);

        let copied_back = image_from_array(&copy, ImportOptions::default().copied()).unwrap();
        prop_assert_eq!(copied_back.pixel_id(), pixel);
        prop_assert!(!copy.shares_buffer_with(copied_back.lifetime_owner()));
        prop_assert_eq!(copied_back.to_bytes(), copy.to_bytes());
    }
}
