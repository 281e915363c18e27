use console::Style;
use seamblend_core::pipeline::{BlendConfig, BlendSummary, SeamStrategy};

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

fn on_off(s: &Styles, enabled: bool) -> String {
    if enabled {
        s.method.apply_to("on").to_string()
    } else {
        s.disabled.apply_to("off").to_string()
    }
}

pub fn print_blend_summary(config: &BlendConfig) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("seamblend"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(9)));
    println!();

    println!("  {}", s.header.apply_to("Inputs"));
    for (i, input) in config.inputs.iter().enumerate() {
        println!(
            "    {:<4}{} {}",
            s.label.apply_to(i),
            s.path.apply_to(input.path.display()),
            s.label.apply_to(format!("@ {},{}", input.x, input.y))
        );
    }
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output.display())
    );
    println!();

    println!("  {}", s.header.apply_to("Blending"));
    println!(
        "    {:<14}{}",
        s.label.apply_to("Max levels"),
        s.value.apply_to(config.blend.max_levels)
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Wraparound"),
        on_off(&s, config.blend.wraparound)
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Assemble"),
        on_off(&s, config.blend.assemble_disjoint)
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Storage"),
        s.method.apply_to(&config.blend.storage)
    );
    println!();

    match &config.seam {
        SeamStrategy::Nearest => {
            println!(
                "  {:<14}{}",
                s.header.apply_to("Seam"),
                s.method.apply_to("nearest boundary")
            );
        }
        SeamStrategy::Deghost(deghost) => {
            println!("  {}", s.header.apply_to("Deghosting"));
            println!(
                "    {:<14}{}",
                s.label.apply_to("Kernel"),
                s.method.apply_to(deghost.kernel)
            );
            println!(
                "    {:<14}{}",
                s.label.apply_to("Sigma"),
                s.value.apply_to(deghost.sigma)
            );
            println!(
                "    {:<14}{}",
                s.label.apply_to("Iterations"),
                s.value.apply_to(deghost.iterations)
            );
            println!("    {:<14}{}", s.label.apply_to("HDR"), on_off(&s, deghost.hdr));
        }
    }

    if let Some(dir) = &config.debug.dir {
        if config.debug.any() {
            println!(
                "  {:<14}{}",
                s.header.apply_to("Debug"),
                s.path.apply_to(dir.display())
            );
        }
    }
    println!();
}

pub fn print_blend_result(summary: &BlendSummary) {
    let s = Styles::new();

    println!();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Canvas"),
        s.value.apply_to(format!(
            "{}x{} {}",
            summary.canvas.width(),
            summary.canvas.height(),
            summary.layout
        ))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Blended"),
        s.value.apply_to(format!(
            "{} images in {} layers",
            summary.images, summary.layers
        ))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Saved"),
        s.path.apply_to(summary.output.display())
    );
}
