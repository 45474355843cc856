use ewmh_client::prelude::*;

fn main() {
    let ewmh = Ewmh::connect(None, None).unwrap();
    let wm_name = ewmh.supporting_wm_check().and_then(|w| w.wm_name()).unwrap_or_default();
    println!("X11 Information");
    println!("-----------------------------------------------------------------------");
    println!("Window Manager:    {}", wm_name);
    println!("Root Window:       {}", ewmh.root());
    println!("Screen:            {}", ewmh.screen());
    println!("Desktops:          {}", ewmh.number_of_desktops().unwrap_or(0));
    println!("Current Desktop:   {}", ewmh.current_desktop().unwrap_or(0));
    println!("Desktop Names:     {:?}", ewmh.desktop_names().unwrap_or_default());
    for (i, area) in ewmh.workarea().unwrap_or_default().iter().enumerate() {
        println!("Work area {:<2}:      {}", i, area);
    }
    println!();
    println!("Clients");
    println!("{:-<72}", "");

    let active = ewmh.active_window().ok().flatten();
    println!("{:<10} {:<6} {}", "ID", "ACTIVE", "NAME");
    for win in ewmh.client_list().unwrap_or_default() {
        let name = win.wm_name().unwrap_or_default();
        println!("{:<10} {:<6} {}", win.to_string(), Some(&win) == active.as_ref(), name);
    }
}
