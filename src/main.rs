//! Orb Ascent entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::{Vec2, Vec3};
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, MouseEvent, TouchEvent};

    use orb_ascent::consts::*;
    use orb_ascent::persistence::{self, format_cooldown, format_save_age};
    use orb_ascent::platform::{self, KeyValueStore, haptics::HOLD_PULSE};
    use orb_ascent::sim::{
        DebrisKind, GameState, OrbContext, OrbInput, OrbMood, OrbState, OrbTimingConfig,
        RunEvent, RunInput, RunOutcome, RunState, ScrapRunConfig, UpgradeId, categories,
        junk_slot, upgrade_cost,
    };
    use orb_ascent::Settings;

    /// Camera distance and vertical field of view used to place run sprites
    const CAMERA_Z: f32 = 10.0;
    const CAMERA_FOV_DEG: f32 = 60.0;

    /// Game instance holding all state
    struct Game {
        state: GameState,
        orb: OrbState,
        timing: OrbTimingConfig,
        run: Option<RunState>,
        run_config: ScrapRunConfig,
        /// Payout summary shown after a run ends
        run_result: Option<(RunOutcome, u64)>,
        settings: Settings,
        store: Box<dyn KeyValueStore>,
        rng: Pcg32,
        accumulator: f32,
        last_time: f64,
        holding: bool,
        pointer: Option<f32>,
        last_save_at: Option<f64>,
        last_autosave: f64,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
        upgrades_dirty: bool,
    }

    impl Game {
        fn new(seed: u64) -> Self {
            let store = platform::open_default_store();
            let settings = Settings::load(store.as_ref());
            let (state, last_save_at) = persistence::load_or_default(store.as_ref());
            Self {
                orb: OrbState::with_charge(state.charge as f32),
                state,
                timing: OrbTimingConfig::default(),
                run: None,
                run_config: ScrapRunConfig::default(),
                run_result: None,
                settings,
                store,
                rng: Pcg32::seed_from_u64(seed),
                accumulator: 0.0,
                last_time: 0.0,
                holding: false,
                pointer: None,
                last_save_at,
                last_autosave: 0.0,
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
                upgrades_dirty: true,
            }
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32, time: f64) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                if self.run.is_some() {
                    self.step_run();
                } else {
                    self.step_orb();
                }
                self.accumulator -= SIM_DT;
                substeps += 1;
            }

            // Track frame times for FPS
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }

            let now = js_sys::Date::now();
            if self.run.is_none() && now - self.last_autosave >= AUTOSAVE_INTERVAL_MS {
                self.save_game(now);
            }
        }

        fn step_orb(&mut self) {
            let ctx = OrbContext {
                physics: &self.state.physics,
                upgrades: &self.state.upgrades,
                prestige_level: self.state.prestige_level,
                timing: &self.timing,
            };
            let tick = self.orb.tick(
                OrbInput {
                    holding: self.holding,
                },
                &ctx,
                SIM_DT,
                &mut self.rng,
            );
            self.state.add_energy(tick.energy);
            self.state.set_charge(tick.charge as f64);

            if let Some(intensity) = tick.release_womp {
                log::debug!("Release womp at {:.2}", intensity);
            }
            if tick.surged {
                log::debug!("Toxic surge (+{:.1})", tick.energy);
            }
            if let Some(mood) = tick.mood_changed {
                if mood == OrbMood::SuperCritical && self.settings.haptics {
                    platform::vibrate(&[30, 40, 30]);
                }
            }
        }

        fn step_run(&mut self) {
            let input = RunInput {
                holding: self.holding,
                pointer: self.pointer,
            };
            let Some(run) = self.run.as_mut() else {
                return;
            };
            if self.run_result.is_some() {
                return;
            }

            for event in run.tick(input, RUN_TICK_MS) {
                match event {
                    RunEvent::BadDebris { lost } if self.settings.haptics => {
                        platform::vibrate(&[20 * lost.max(1)]);
                    }
                    RunEvent::GameOver if self.settings.haptics => {
                        platform::vibrate(&[60, 40, 60]);
                    }
                    _ => {}
                }
            }

            if !run.is_running() {
                let outcome = run.outcome();
                let payout = self.state.end_scrap_run(outcome.score, outcome.collected);
                self.run_result = Some((outcome, payout));
                self.upgrades_dirty = true;
                self.save_game(js_sys::Date::now());
            }
        }

        fn start_run(&mut self) {
            let now = js_sys::Date::now();
            match self.state.start_scrap_run(now) {
                Ok(()) => {
                    let seed = self.rng.random::<u64>();
                    self.run = Some(RunState::new(
                        seed,
                        &self.run_config,
                        &self.state.upgrades,
                        false,
                    ));
                    self.run_result = None;
                    self.holding = false;
                    self.pointer = None;
                    self.save_game(now);
                }
                Err(e) => log::info!("Cannot launch: {}", e),
            }
        }

        /// Abort button: forfeits everything gathered
        fn abort_run(&mut self) {
            if let Some(run) = self.run.as_mut() {
                if self.run_result.is_none() {
                    let outcome = run.abort();
                    self.state.end_scrap_run(outcome.score, outcome.collected);
                }
            }
            self.close_run();
        }

        fn close_run(&mut self) {
            self.run = None;
            self.run_result = None;
            self.holding = false;
            self.upgrades_dirty = true;
            self.save_game(js_sys::Date::now());
        }

        fn buy(&mut self, id: UpgradeId) {
            match self.state.purchase_upgrade(id) {
                Ok(_) => {
                    self.upgrades_dirty = true;
                    self.save_game(js_sys::Date::now());
                }
                Err(e) => log::info!("Purchase refused: {}", e),
            }
        }

        fn prestige(&mut self) {
            match self.state.prestige() {
                Ok(_) => {
                    self.orb = OrbState::new();
                    self.upgrades_dirty = true;
                    self.save_game(js_sys::Date::now());
                }
                Err(e) => log::info!("Prestige refused: {}", e),
            }
        }

        fn set_holding(&mut self, holding: bool) {
            self.holding = holding;
        }

        /// Save progress to storage
        fn save_game(&mut self, now: f64) {
            match persistence::save(self.store.as_mut(), &self.state, now) {
                Ok(()) => {
                    self.last_save_at = Some(now);
                }
                Err(e) => log::warn!("Save failed: {}", e),
            }
            self.last_autosave = now;
        }

        /// Update HUD elements in DOM
        fn update_hud(&mut self, doc: &Document) {
            let now = js_sys::Date::now();

            set_text(doc, "hud-energy", &format!("{:.0}", self.state.energy));
            set_text(doc, "hud-scrap", &self.state.scrap.to_string());
            set_text(doc, "hud-charge", &format!("{:.0}%", self.state.charge * 100.0));
            set_text(doc, "hud-prestige", &self.state.prestige_level.to_string());
            set_text(doc, "hud-essence", &self.state.cosmic_essence.to_string());
            set_text(doc, "hud-best", &self.state.best_run_score.to_string());
            set_text(doc, "hud-saved", &format_save_age(self.last_save_at, now));
            set_text(doc, "hud-fps", &self.fps.to_string());
            set_class(doc, "hud-fps-item", if self.settings.show_fps { "hud-item" } else { "hud-item hidden" });

            if let Some(btn) = doc.get_element_by_id("start-run-btn") {
                let remaining = self.state.cooldown_remaining_ms(now);
                if remaining > 0.0 {
                    btn.set_text_content(Some(&format!("Cooldown {}", format_cooldown(remaining))));
                    let _ = btn.set_attribute("disabled", "");
                } else {
                    btn.set_text_content(Some("Start Trash Run"));
                    let _ = btn.remove_attribute("disabled");
                }
            }

            if let Some(btn) = doc.get_element_by_id("prestige-btn") {
                if self.state.can_prestige() {
                    btn.set_text_content(Some(&format!(
                        "Prestige (+{} essence)",
                        self.state.prestige_preview()
                    )));
                    let _ = btn.remove_attribute("disabled");
                } else {
                    btn.set_text_content(Some(&format!(
                        "Prestige at {:.0} energy",
                        PRESTIGE_ENERGY_THRESHOLD
                    )));
                    let _ = btn.set_attribute("disabled", "");
                }
            }

            if self.upgrades_dirty {
                if let Some(panel) = doc.get_element_by_id("upgrade-list") {
                    panel.set_inner_html(&upgrade_panel_html(&self.state));
                }
                self.upgrades_dirty = false;
            }

            match &self.run {
                Some(run) => {
                    set_class(doc, "menu", "hidden");
                    set_class(doc, "orb", "hidden");
                    set_class(doc, "run-overlay", "");
                    self.render_run(doc, run);
                }
                None => {
                    set_class(doc, "menu", "");
                    set_class(doc, "run-overlay", "hidden");
                    self.render_orb(doc);
                }
            }
        }

        fn render_orb(&self, doc: &Document) {
            let Some(orb) = doc.get_element_by_id("orb") else {
                return;
            };
            let pose = self.orb.pose(&self.timing, self.settings.quality.bloom_floor());
            let motion = self.settings.orb_motion();
            let bob = if motion { pose.bob * 100.0 } else { 0.0 };
            let scale = if motion { pose.scale } else { 1.0 + self.orb.charge * 0.2 };
            let glow = if self.settings.particles { pose.bloom * 12.0 } else { 0.0 };
            let _ = orb.set_attribute(
                "style",
                &format!(
                    "transform: translateY({:.1}px) scale({:.3}) rotate({:.3}rad); \
                     box-shadow: 0 0 {:.0}px {:.0}px rgba(132, 204, 22, {:.2});",
                    bob,
                    scale,
                    pose.rotation_y,
                    glow,
                    pose.light_intensity * 4.0,
                    pose.particle_opacity,
                ),
            );
            let _ = orb.set_attribute("class", &format!("orb mood-{}", self.orb.mood.as_str()));
        }

        fn render_run(&self, doc: &Document, run: &RunState) {
            let (w, h) = viewport(doc);
            set_text(doc, "run-score", &run.score.to_string());
            set_text(doc, "run-collected", &run.collected.to_string());
            set_text(doc, "run-shields", &run.shields.to_string());

            let mut html = String::new();
            for piece in &run.debris {
                let Some((x, y, s)) = project(piece.position, w, h) else {
                    continue;
                };
                let kind = match piece.kind {
                    DebrisKind::Good => "good",
                    DebrisKind::Bad => "bad",
                };
                html.push_str(&format!(
                    "<div class=\"debris {}{}\" style=\"left:{:.1}px;top:{:.1}px;transform:scale({:.3}) rotate({:.3}rad)\"></div>",
                    kind,
                    if self.settings.show_hitboxes { " hitbox" } else { "" },
                    x,
                    y,
                    s,
                    piece.rotation.y,
                ));
                if self.settings.show_curvature {
                    for point in run.config.curve_preview(piece.origin, 20) {
                        if let Some((cx, cy, _)) = project(point, w, h) {
                            html.push_str(&format!(
                                "<div class=\"curve-dot {}\" style=\"left:{:.1}px;top:{:.1}px\"></div>",
                                kind, cx, cy
                            ));
                        }
                    }
                }
            }

            let charge = run.visual_charge();
            if let Some((px, py, ps)) = project(run.player, w, h) {
                html.push_str(&format!(
                    "<div class=\"run-player\" style=\"left:{:.1}px;top:{:.1}px;transform:scale({:.3});opacity:{:.2}\"></div>",
                    px,
                    py,
                    ps * (1.0 + run.hitbox_radius() * 0.5),
                    0.4 + charge * 0.6,
                ));
                for i in 0..run.collected {
                    let offset = junk_slot(i);
                    let spin = Vec2::from_angle(run.player_spin).rotate(Vec2::new(offset.x, offset.z));
                    if let Some((jx, jy, js)) = project(run.player + Vec3::new(spin.x, offset.y, spin.y), w, h) {
                        html.push_str(&format!(
                            "<div class=\"junk\" style=\"left:{:.1}px;top:{:.1}px;transform:scale({:.3})\"></div>",
                            jx,
                            jy,
                            js * 0.5
                        ));
                    }
                }
            }

            if let Some(field) = doc.get_element_by_id("run-field") {
                field.set_inner_html(&html);
            }

            match self.run_result {
                Some((outcome, payout)) => {
                    set_class(doc, "run-summary", "");
                    set_text(doc, "final-score", &outcome.score.to_string());
                    set_text(doc, "final-payout", &payout.to_string());
                }
                None => set_class(doc, "run-summary", "hidden"),
            }
        }
    }

    /// Perspective projection of a world point to screen pixels + scale
    fn project(p: Vec3, w: f32, h: f32) -> Option<(f32, f32, f32)> {
        let depth = CAMERA_Z - p.z;
        if depth <= 0.1 {
            return None;
        }
        let focal = (h / 2.0) / (CAMERA_FOV_DEG.to_radians() / 2.0).tan();
        let scale = focal / depth;
        Some((w / 2.0 + p.x * scale, h / 2.0 - p.y * scale, scale / 40.0))
    }

    fn viewport(doc: &Document) -> (f32, f32) {
        doc.document_element()
            .map(|el| (el.client_width() as f32, el.client_height() as f32))
            .unwrap_or((800.0, 600.0))
    }

    fn upgrade_panel_html(state: &GameState) -> String {
        let mut html = String::new();
        for category in categories() {
            html.push_str(&format!(
                "<section class=\"upgrade-category\" style=\"border-color:{}\"><h3>{}</h3>",
                category.accent, category.label
            ));
            for upgrade in category.upgrades {
                let level = state.level(upgrade.id);
                let maxed = level >= upgrade.max;
                let cost = upgrade_cost(upgrade.id, level);
                let affordable = !maxed && state.scrap >= cost;
                let unlocks: Vec<&str> = upgrade
                    .breakpoints
                    .iter()
                    .filter(|(at, _)| level >= *at)
                    .map(|(_, text)| *text)
                    .collect();
                html.push_str(&format!(
                    "<button class=\"upgrade{}\" data-upgrade=\"{}\"{}>\
                     <span class=\"upgrade-label\">{}</span>\
                     <span class=\"upgrade-level\">{}/{}</span>\
                     <span class=\"upgrade-desc\">{} ({})</span>\
                     <span class=\"upgrade-unlocks\">{}</span>\
                     <span class=\"upgrade-cost\">{}</span></button>",
                    if affordable { " affordable" } else { "" },
                    upgrade.id.as_str(),
                    if affordable { "" } else { " disabled" },
                    upgrade.label,
                    level,
                    upgrade.max,
                    upgrade.desc,
                    upgrade.per_level,
                    unlocks.join(" / "),
                    if maxed { "MAX".to_string() } else { format!("{} scrap", cost) },
                ));
            }
            html.push_str("</section>");
        }
        html
    }

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn set_text(doc: &Document, id: &str, text: &str) {
        if let Some(el) = doc.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_class(doc: &Document, id: &str, class: &str) {
        if let Some(el) = doc.get_element_by_id(id) {
            let _ = el.set_attribute("class", class);
        }
    }

    /// Whether an event started inside the menu panels (not an orb hold)
    fn in_ui_layer(event: &web_sys::Event) -> bool {
        event
            .target()
            .and_then(|t| t.dyn_into::<Element>().ok())
            .and_then(|el| el.closest("#menu, #run-overlay button").ok().flatten())
            .is_some()
    }

    fn on_click(doc: &Document, id: &str, mut handler: impl FnMut() + 'static) {
        if let Some(btn) = doc.get_element_by_id(id) {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| handler());
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Orb Ascent starting...");

        let Some(document) = document() else {
            log::error!("No document available");
            return;
        };

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed)));
        log::info!("Game initialized with seed: {}", seed);

        setup_input_handlers(&document, game.clone());
        setup_buttons(&document, game.clone());
        setup_auto_save(&document, game.clone());

        request_animation_frame(game);

        log::info!("Orb Ascent running!");
    }

    fn setup_input_handlers(document: &Document, game: Rc<RefCell<Game>>) {
        let Some(stage) = document.get_element_by_id("stage") else {
            log::warn!("No #stage element; input disabled");
            return;
        };

        // Mouse down/up - hold the orb (or climb and steer during a run)
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                if in_ui_layer(&event) {
                    return;
                }
                let mut g = game.borrow_mut();
                g.set_holding(true);
                if g.run.is_some() {
                    let width = document().map(|d| viewport(&d).0).unwrap_or(0.0);
                    g.pointer = platform::drag_target(true, event.client_x() as f32, width);
                }
            });
            let _ = stage.add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        for name in ["mouseup", "mouseleave"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                g.set_holding(false);
                g.pointer = None;
            });
            let _ = stage.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse move - drag to strafe during runs
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                if g.run.is_some() {
                    let width = document().map(|d| viewport(&d).0).unwrap_or(0.0);
                    g.pointer = platform::drag_target(g.holding, event.client_x() as f32, width);
                }
            });
            let _ = stage.add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch start - holds only count in the middle band of the screen
        {
            let game = game.clone();
            let stage_clone = stage.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                if in_ui_layer(&event) {
                    return;
                }
                let Some(touch) = event.touches().get(0) else {
                    return;
                };
                let rect = stage_clone.get_bounding_client_rect();
                let mut g = game.borrow_mut();
                if g.run.is_some() {
                    event.prevent_default();
                    let x = touch.client_x() as f32 - rect.left() as f32;
                    g.pointer = Some(platform::normalized_pointer(x, rect.width() as f32));
                    g.set_holding(true);
                    return;
                }
                let y = touch.client_y() as f32 - rect.top() as f32;
                if platform::in_hold_band(y, rect.height() as f32) {
                    event.prevent_default();
                    g.set_holding(true);
                    if g.settings.haptics {
                        platform::vibrate(HOLD_PULSE);
                    }
                }
            });
            let _ = stage.add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch move - strafe during runs
        {
            let game = game.clone();
            let stage_clone = stage.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                let mut g = game.borrow_mut();
                if g.run.is_none() {
                    return;
                }
                if let Some(touch) = event.touches().get(0) {
                    event.prevent_default();
                    let rect = stage_clone.get_bounding_client_rect();
                    let x = touch.client_x() as f32 - rect.left() as f32;
                    g.pointer = Some(platform::normalized_pointer(x, rect.width() as f32));
                }
            });
            let _ = stage.add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch end
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: TouchEvent| {
                let mut g = game.borrow_mut();
                g.set_holding(false);
                g.pointer = None;
            });
            let _ = stage.add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard - space holds, escape aborts a run
        if let Some(window) = web_sys::window() {
            {
                let game = game.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                    let mut g = game.borrow_mut();
                    match event.key().as_str() {
                        " " => g.set_holding(true),
                        "ArrowLeft" if g.run.is_some() => g.pointer = Some(-1.0),
                        "ArrowRight" if g.run.is_some() => g.pointer = Some(1.0),
                        "Escape" if g.run.is_some() => g.abort_run(),
                        _ => {}
                    }
                });
                let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
                closure.forget();
            }
            {
                let game = game.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                    let mut g = game.borrow_mut();
                    match event.key().as_str() {
                        " " => g.set_holding(false),
                        "ArrowLeft" | "ArrowRight" => g.pointer = None,
                        _ => {}
                    }
                });
                let _ = window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }
    }

    fn setup_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        {
            let game = game.clone();
            on_click(document, "start-run-btn", move || game.borrow_mut().start_run());
        }
        {
            let game = game.clone();
            on_click(document, "prestige-btn", move || game.borrow_mut().prestige());
        }
        {
            let game = game.clone();
            on_click(document, "abort-btn", move || game.borrow_mut().abort_run());
        }
        {
            let game = game.clone();
            on_click(document, "return-btn", move || game.borrow_mut().close_run());
        }

        // Upgrade buttons are re-rendered, so listen on the list
        if let Some(list) = document.get_element_by_id("upgrade-list") {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let id = event
                    .target()
                    .and_then(|t| t.dyn_into::<Element>().ok())
                    .and_then(|el| el.closest("[data-upgrade]").ok().flatten())
                    .and_then(|el| el.get_attribute("data-upgrade"))
                    .and_then(|key| UpgradeId::from_str(&key));
                if let Some(id) = id {
                    game.borrow_mut().buy(id);
                }
            });
            let _ = list.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_save(document: &Document, game: Rc<RefCell<Game>>) {
        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut g = game.borrow_mut();
                    g.set_holding(false);
                    g.save_game(js_sys::Date::now());
                    log::info!("Saved (tab hidden)");
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside) drops any hold
        if let Some(window) = web_sys::window() {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().set_holding(false);
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;

            g.update(dt, time);
            if let Some(doc) = document() {
                g.update_hud(&doc);
            }
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Orb Ascent (native) starting...");
    log::info!("The game runs in the browser - build for wasm32 and serve index.html");

    simulate_session();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless sanity run: charge the orb, run a scrap run, report the result
#[cfg(not(target_arch = "wasm32"))]
fn simulate_session() {
    use orb_ascent::consts::{RUN_TICK_MS, SIM_DT};
    use orb_ascent::sim::{
        GameState, OrbContext, OrbInput, OrbState, OrbTimingConfig, RunInput, RunState,
        ScrapRunConfig,
    };
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    let mut state = GameState::new();
    let mut orb = OrbState::new();
    let timing = OrbTimingConfig::default();
    let mut rng = Pcg32::seed_from_u64(7);

    // 20 seconds holding, 10 seconds released
    for i in 0..(30 * 60) {
        let ctx = OrbContext {
            physics: &state.physics,
            upgrades: &state.upgrades,
            prestige_level: state.prestige_level,
            timing: &timing,
        };
        let tick = orb.tick(OrbInput { holding: i < 20 * 60 }, &ctx, SIM_DT, &mut rng);
        state.add_energy(tick.energy);
        state.set_charge(tick.charge as f64);
    }
    log::info!("Orb session: {:.1} energy", state.energy);

    let now = 1_000_000.0;
    if let Err(e) = state.start_scrap_run(now) {
        log::warn!("Run refused: {}", e);
        return;
    }
    let mut run = RunState::new(7, &ScrapRunConfig::default(), &state.upgrades, false);
    let mut frames = 0u32;
    while run.is_running() && frames < 60 * 120 {
        let sway = ((frames as f32) * 0.02).sin();
        run.tick(
            RunInput {
                holding: frames % 120 < 60,
                pointer: Some(sway),
            },
            RUN_TICK_MS,
        );
        frames += 1;
    }
    let outcome = run.outcome();
    let payout = state.end_scrap_run(outcome.score, outcome.collected);
    log::info!(
        "Scrap run: score {} collected {} -> {} scrap after {} frames",
        outcome.score,
        outcome.collected,
        payout,
        frames
    );
}
