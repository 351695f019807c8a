use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::Keycode;
use glaze::{
    cgmath::Vector2,
    scenegraph::{Drawable, StencilDrawable},
    shapes,
    Color, DisplayConfig, DrawingContext, FRect, GraphicsContext, IRect, ISize, Line, Quad,
};
use std::rc::Rc;

fn frame(dc: &mut DrawingContext, t: f32, size: ISize) {
    let (w, h) = (size.width as f32, size.height as f32);
    dc.fill_screen(Color::from_rgb(0.1, 0.1, 0.15));

    // drawn last even though submitted first
    dc.fill_rounded_rect(&FRect::new(40.0, 40.0, 360.0, 200.0), 16.0, Color::from_rgba(0.9, 0.4, 0.2, 0.8), 2.0);
    dc.fill_rect(&FRect::new(120.0, 100.0, 440.0, 300.0), Color::from_rgb(0.2, 0.5, 0.9), 1.0);
    dc.draw_rect(&FRect::new(120.0, 100.0, 440.0, 300.0), Color::white(), 1.0);

    dc.push_modelview();
    dc.translate(w * 0.75, h * 0.5, 0.0);
    dc.rotate(t * 45.0, 0.0, 0.0, 1.0);
    let quad = Quad::from_rect(&FRect::new(-80.0, -80.0, 80.0, 80.0));
    dc.fill_quad(&quad, Color::from_rgb(0.3, 0.8, 0.4), 0.0);
    dc.draw_line(&Line::new(Vector2::new(-120.0, 0.0), Vector2::new(120.0, 0.0)), Color::white(), 0.5);
    dc.pop_modelview();

    let center = Vector2::new(w * 0.3, h * 0.7);
    dc.fill_circle(center, 60.0 + 20.0 * t.sin(), Color::from_rgb(0.8, 0.8, 0.2), 0.0);
    dc.draw_circle(center, 90.0, Color::white(), 0.0);
}

fn masked_stripes(size: ISize) -> StencilDrawable {
    let mut stencil = StencilDrawable::new();
    let mask: Rc<dyn Drawable> = Rc::new(shapes::fill_circle(Vector2::new(size.width as f32 * 0.5, 120.0), 100.0, Color::white(), 48));
    stencil.stencil_group_mut().add_drawable(mask);
    for i in 0..(size.width / 20) {
        let x = (i * 20) as f32;
        let stripe: Rc<dyn Drawable> = Rc::new(shapes::fill_rect(
            &FRect::new(x, 0.0, x + 10.0, 240.0),
            Color::from_rgb(0.9, 0.2, 0.6),
        ));
        stencil.drawable_group_mut().add_drawable(stripe);
    }
    stencil
}

fn run(sdl_context: &sdl2::Sdl, window: &sdl2::video::Window) -> Result<(), Box<dyn std::error::Error>> {
    let (w, h) = window.drawable_size();
    let config = DisplayConfig::default().with_initial_size(w as i32, h as i32);
    let mut gc = GraphicsContext::new(&config)?;
    let mut dc = DrawingContext::new(&config);
    let mut event_pump = sdl_context.event_pump()?;

    let start = std::time::Instant::now();
    let mut last_report = std::time::Instant::now();
    let mut frames = 0u32;
    'running: loop {
        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. } | Event::KeyDown { keycode: Some(Keycode::Escape), .. } => break 'running,
                Event::Window { win_event: WindowEvent::SizeChanged(w, h), .. } => {
                    gc.resize(ISize::new(w, h));
                },
                _ => {},
            }
        }

        let size = gc.size();
        frame(&mut dc, start.elapsed().as_secs_f32(), size);
        dc.draw(Box::new(masked_stripes(size)));
        dc.render(&mut gc);
        dc.clear();

        // immediate drawing goes straight on top of the sorted frame
        gc.push_cliprect(IRect::new(0, size.height - 40, size.width, size.height));
        gc.draw_grid(Vector2::new(0.0, 0.0), glaze::FSize::new(16.0, 16.0), Color::from_rgba(1.0, 1.0, 1.0, 0.3));
        gc.pop_cliprect();

        if let Some(e) = glaze::gl_utils::gl_get_error() {
            log::error!("gl error {} during frame", glaze::gl_utils::gl_error_name(e));
        }
        window.gl_swap_window();

        frames += 1;
        if last_report.elapsed().as_secs() >= 5 {
            log::info!("{} fps", frames / 5);
            frames = 0;
            last_report = std::time::Instant::now();
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let sdl_context = sdl2::init()?;
    let video_subsystem = sdl_context.video()?;

    let gl_attr = video_subsystem.gl_attr();
    gl_attr.set_context_profile(sdl2::video::GLProfile::Core);
    gl_attr.set_context_version(3, 3);
    gl_attr.set_stencil_size(8);

    let window = video_subsystem.window("glaze", 1280, 720)
        .resizable()
        .opengl()
        .build()?;

    let _ctx = window.gl_create_context()?;
    gl::load_with(|name| video_subsystem.gl_get_proc_address(name) as *const _);

    run(&sdl_context, &window)
}
