use arrayview_canvas::layout::{Descriptor, ElementKind, LifetimeOwner};
use arrayview_canvas::{
    array_view_from_image, image_from_array, image_from_buffer, ArrayView, Image, ImportOptions,
    PixelId, ViewOptions,
};
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn view_outlives_image() {
    let mut image = Image::new(&[8, 8], PixelId::Float32).unwrap();
    image.set_pixel(&[7, 6], 1.5f32).unwrap();

    let view = array_view_from_image(&image, ViewOptions::default()).unwrap();
    assert_eq!(image.lifetime_owner().holders(), 2);

    drop(image);
    assert_eq!(view.holders(), 1);
    assert_eq!(view.get::<f32>(&[6, 7]).unwrap(), 1.5);
}

#[test]
fn image_outlives_array() {
    let array = ArrayView::from_elements(&[2, 2], &[1u64, 2, 3, 4]).unwrap();
    let image = image_from_array(&array, ImportOptions::default()).unwrap();

    drop(array);
    assert!(image.lifetime_owner().is_unique());
    assert_eq!(image.get_pixel::<u64>(&[1, 1]).unwrap(), 4);
}

#[test]
fn shallow_copy_after_delete() {
    let image = Image::new(&[4, 4], PixelId::Int8).unwrap();
    let view = array_view_from_image(&image, ViewOptions::default().writable()).unwrap();
    let alias = view.clone();

    drop(view);
    drop(image);

    alias.set(&[3, 3], -1i8).unwrap();
    assert_eq!(alias.get::<i8>(&[3, 3]).unwrap(), -1);
    assert_eq!(alias.holders(), 1);
}

#[test]
fn released_once_in_any_order() {
    let descriptor = Descriptor::row_major(ElementKind::U8, 1, vec![4, 4]).unwrap();

    // Indices into image, view and slice, in the order they are dropped.
    for order in [[0, 1, 2], [1, 0, 2], [2, 1, 0], [1, 2, 0]] {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let buffer = LifetimeOwner::new(16)
            .with_finalizer(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .expect("Just allocated");

        let image =
            image_from_buffer(buffer, descriptor.clone(), ImportOptions::default()).unwrap();
        let view = array_view_from_image(&image, ViewOptions::default()).unwrap();
        let slice = view.slice_axis(0, 1..3).unwrap();

        let mut holders: [Option<Box<dyn Any>>; 3] =
            [Some(Box::new(image)), Some(Box::new(view)), Some(Box::new(slice))];
        for (step, &which) in order.iter().enumerate() {
            assert_eq!(released.load(Ordering::SeqCst), 0, "released early at {}", step);
            drop(holders[which].take());
        }

        assert_eq!(released.load(Ordering::SeqCst), 1, "order {:?}", order);
    }
}

#[test]
fn parallel_writers_and_holders() {
    const ROWS: usize = 16;
    let image = Image::new(&[32, ROWS], PixelId::UInt16).unwrap();
    let barrier = &Barrier::new(ROWS);

    thread::scope(|join| {
        for row in 0..ROWS {
            let view = array_view_from_image(&image, ViewOptions::default().writable()).unwrap();
            join.spawn(move || {
                let _ = barrier.wait();
                for col in 0..32 {
                    view.set(&[row, col], (row * 32 + col) as u16).unwrap();
                }
            });
        }
    });

    assert!(image.lifetime_owner().is_unique());
    for row in 0..ROWS {
        for col in 0..32 {
            assert_eq!(
                image.get_pixel::<u16>(&[col, row]).unwrap(),
                (row * 32 + col) as u16
            );
        }
    }
}

#[test]
fn bit_images_sharing_a_buffer() {
    let mut evens = Image::new(&[8, 2], PixelId::Bit).unwrap();
    let mut odds = Image::new(&[8, 2], PixelId::Bit).unwrap();
    odds.attach_owner(evens.lifetime_owner().clone()).unwrap();

    // Each image writes its own columns, all of which share bytes with the other's.
    thread::scope(|join| {
        for (image, first) in [(&mut evens, 0), (&mut odds, 1)] {
            join.spawn(move || {
                for round in 0..=500 {
                    for x in (first..8).step_by(2) {
                        for y in 0..2 {
                            image.set_pixel(&[x, y], u8::from(round % 2 == 0)).unwrap();
                        }
                    }
                }
            });
        }
    });

    for x in 0..8 {
        for y in 0..2 {
            assert_eq!(evens.get_pixel::<u8>(&[x, y]).unwrap(), 1, "pixel ({}, {})", x, y);
            assert_eq!(odds.get_pixel::<u8>(&[x, y]).unwrap(), 1, "pixel ({}, {})", x, y);
        }
    }
}
