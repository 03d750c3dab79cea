use sdl2::{
    EventPump, Sdl,
    event::{Event, WindowEvent},
    keyboard::Keycode,
    pixels::{Color, PixelFormatEnum},
    rect::Rect,
    render::{Canvas, TextureAccess, TextureCreator},
    video::{Window, WindowContext},
};
use tracing::{debug, warn};

use super::{FrameSink, SinkControl, letterbox};
use crate::{
    error::DisplayError,
    frame::{Frame, RgbFrame},
};

const INITIAL_SIZE: (u32, u32) = (640, 480);

/// The one window of the process. Created in `main`, closed on drop.
pub struct SdlWindow {
    canvas: Canvas<Window>,
    texture_creator: TextureCreator<WindowContext>,
    event_pump: EventPump,
    sized_to_frame: bool,
    last: Option<RgbFrame>,
    _sdl: Sdl,
}

fn sdl_err(e: impl ToString) -> DisplayError {
    DisplayError::Sdl(e.to_string())
}

impl SdlWindow {
    pub fn open(title: &str) -> Result<Self, DisplayError> {
        let sdl = sdl2::init().map_err(sdl_err)?;
        let video_subsystem = sdl.video().map_err(sdl_err)?;
        let window = video_subsystem
            .window(title, INITIAL_SIZE.0, INITIAL_SIZE.1)
            .position_centered()
            .resizable()
            .build()
            .map_err(sdl_err)?;

        let mut canvas = window.into_canvas().build().map_err(sdl_err)?;
        canvas.set_draw_color(Color::RGB(0, 0, 0));
        canvas.clear();
        canvas.present();

        let texture_creator = canvas.texture_creator();
        let event_pump = sdl.event_pump().map_err(sdl_err)?;
        debug!(title, "window opened");

        Ok(SdlWindow {
            canvas,
            texture_creator,
            event_pump,
            sized_to_frame: false,
            last: None,
            _sdl: sdl,
        })
    }

    fn draw(&mut self, image: &RgbFrame) -> Result<(), DisplayError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(DisplayError::BadFrame { width, height });
        }

        let mut texture = self
            .texture_creator
            .create_texture(
                PixelFormatEnum::RGB24,
                TextureAccess::Streaming,
                width,
                height,
            )
            .map_err(sdl_err)?;
        texture
            .update(None, image.pixels(), image.pitch())
            .map_err(sdl_err)?;

        let (win_w, win_h) = self.canvas.output_size().map_err(sdl_err)?;
        let fit = letterbox(width, height, win_w, win_h);
        let dest_rect = Rect::new(fit.x, fit.y, fit.width, fit.height);

        self.canvas.set_draw_color(Color::RGB(0, 0, 0));
        self.canvas.clear();
        self.canvas
            .copy(&texture, None, Some(dest_rect))
            .map_err(sdl_err)?;
        self.canvas.present();
        Ok(())
    }
}

impl FrameSink for SdlWindow {
    fn show(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        let image = &frame.image;
        if !self.sized_to_frame && image.width() > 0 && image.height() > 0 {
            self.canvas
                .window_mut()
                .set_size(image.width(), image.height())
                .map_err(sdl_err)?;
            self.sized_to_frame = true;
        }

        self.draw(image)?;
        self.last = Some(image.clone());
        Ok(())
    }

    fn pump(&mut self) -> SinkControl {
        let mut redraw = false;
        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => return SinkControl::Quit,
                Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => return SinkControl::Quit,
                Event::KeyDown {
                    keycode: Some(Keycode::Q),
                    ..
                } => return SinkControl::Quit,
                Event::Window {
                    win_event: WindowEvent::SizeChanged(..) | WindowEvent::Exposed,
                    ..
                } => redraw = true,
                _ => {}
            }
        }

        if redraw {
            if let Some(image) = self.last.take() {
                if let Err(e) = self.draw(&image) {
                    warn!("redraw failed: {e}");
                }
                self.last = Some(image);
            }
        }
        SinkControl::Continue
    }
}
