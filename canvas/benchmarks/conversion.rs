//! Benchmarks sharing against copying, in both directions.
use brunch::Bench;

use arrayview_canvas::{
    array_view_from_image, image_from_array, ArrayView, BridgeError, Image, ImportOptions,
    PixelId, ViewOptions,
};

#[derive(Debug)]
struct Convert {
    pixel: PixelId,
    zero_copy: bool,
    sz: usize,
}

impl Convert {
    fn name(&self, direction: &str) -> String {
        format!(
            "{}({}, {}, {})",
            direction,
            self.pixel,
            if self.zero_copy { "view" } else { "copy" },
            self.sz
        )
    }

    fn prepare_view(&self) -> Result<impl FnMut() -> ArrayView, BridgeError> {
        let image = Image::new(&[self.sz, self.sz, self.sz], self.pixel)?;
        let options = ViewOptions::default().with_zero_copy(self.zero_copy);
        // Fail during setup, not while measuring.
        array_view_from_image(&image, options)?;

        Ok(move || match array_view_from_image(&image, options) {
            Ok(view) => view,
            Err(err) => panic!("Conversion failed after setup: {}", err),
        })
    }

    fn prepare_import(&self) -> Result<impl FnMut() -> Image, BridgeError> {
        let image = Image::new(&[self.sz, self.sz, self.sz], self.pixel)?;
        let array = array_view_from_image(&image, ViewOptions::default().writable())?;
        let options = ImportOptions::default().with_zero_copy(self.zero_copy);
        image_from_array(&array, options)?;

        Ok(move || match image_from_array(&array, options) {
            Ok(image) => image,
            Err(err) => panic!("Conversion failed after setup: {}", err),
        })
    }
}

fn main() {
    let mut tests = vec![];
    for pixel in [PixelId::UInt8, PixelId::Float32, PixelId::VectorFloat64] {
        for zero_copy in [true, false] {
            tests.push(Convert {
                pixel,
                zero_copy,
                sz: 64,
            });
        }
    }

    let mut benches = brunch::Benches::default();
    for convert in &tests {
        let bench = match convert.prepare_view() {
            Ok(bench) => bench,
            Err(err) => panic!("Failed to setup benchmark {:?}: {:?}", convert, err),
        };

        let name = format!("arrayview::conversion::{}", convert.name("view"));
        benches.push(Bench::new(name).run(bench));

        let bench = match convert.prepare_import() {
            Ok(bench) => bench,
            Err(err) => panic!("Failed to setup benchmark {:?}: {:?}", convert, err),
        };

        let name = format!("arrayview::conversion::{}", convert.name("import"));
        benches.push(Bench::new(name).run(bench));
    }

    benches.finish();
}
