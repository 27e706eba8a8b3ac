use super::*;

#[test]
fn ass_colours_are_abgr_with_inverted_alpha() {
    assert_eq!(AssColor::WHITE.to_ass(), "&H00FFFFFF");
    assert_eq!(AssColor::rgb(0x11, 0x22, 0x33).to_ass(), "&H00332211");
    assert_eq!(AssColor::rgba(0, 0, 0, 0).to_ass(), "&HFF000000");
    assert_eq!(AssColor::rgba(0, 0, 0, 0x80).to_ass(), "&H7F000000");
}

#[test]
fn colour_parsing_accepts_css_and_ass_forms() {
    assert_eq!(AssColor::parse("#112233").unwrap(), AssColor::rgb(0x11, 0x22, 0x33));
    assert_eq!(
        AssColor::parse("#11223380").unwrap(),
        AssColor::rgba(0x11, 0x22, 0x33, 0x80)
    );
    assert_eq!(AssColor::parse("&H332211").unwrap(), AssColor::rgb(0x11, 0x22, 0x33));
    assert_eq!(AssColor::parse("&H00FFFFFF&").unwrap(), AssColor::WHITE);
    assert_eq!(
        AssColor::parse("&HFF000000").unwrap(),
        AssColor::rgba(0, 0, 0, 0)
    );
    for bad in ["", "red", "#12", "&H12345", "#zzzzzz"] {
        assert!(AssColor::parse(bad).is_err(), "{bad}");
    }
}

#[test]
fn alignment_rows_and_columns() {
    assert!(Alignment::new(0).is_err());
    assert!(Alignment::new(10).is_err());
    let cases = [
        (1, Row::Bottom, Column::Left),
        (2, Row::Bottom, Column::Center),
        (3, Row::Bottom, Column::Right),
        (5, Row::Middle, Column::Center),
        (7, Row::Top, Column::Left),
        (9, Row::Top, Column::Right),
    ];
    for (v, row, col) in cases {
        let a = Alignment::new(v).unwrap();
        assert_eq!(a.row(), row, "{v}");
        assert_eq!(a.column(), col, "{v}");
    }
}

#[test]
fn default_force_style_matches_burn_in_defaults() {
    let style = SubtitleStyle::default();
    style.validate().unwrap();
    assert_eq!(
        style.force_style(),
        "Fontname=Microsoft YaHei,Fontsize=12,PrimaryColour=&H00FFFFFF,\
         OutlineColour=&H00000000,BackColour=&HFF000000,Bold=0,Outline=1,Shadow=0,\
         Alignment=2,MarginL=10,MarginR=10,MarginV=20"
    );
}

#[test]
fn validation_rejects_bad_records() {
    let bad_font = SubtitleStyle {
        font_family: "Arial,Bold".to_owned(),
        ..SubtitleStyle::default()
    };
    assert!(bad_font.validate().is_err());

    let zero_size = SubtitleStyle {
        font_size: 0,
        ..SubtitleStyle::default()
    };
    assert!(zero_size.validate().is_err());

    let bad_enc = SubtitleStyle {
        encoding: "utf 8".to_owned(),
        ..SubtitleStyle::default()
    };
    assert!(bad_enc.validate().is_err());
}

#[test]
fn style_json_defaults_and_alignment_bounds() {
    let style: SubtitleStyle =
        serde_json::from_str(r##"{ "font_size": 24, "alignment": 8, "primary_color": "#ffff00" }"##)
            .unwrap();
    assert_eq!(style.font_size, 24);
    assert_eq!(style.alignment.row(), Row::Top);
    assert_eq!(style.primary_color, AssColor::rgb(255, 255, 0));
    assert_eq!(style.margin_v, 20);

    assert!(serde_json::from_str::<SubtitleStyle>(r#"{ "alignment": 12 }"#).is_err());
}

#[test]
fn filter_arg_escapes_windows_paths() {
    let track = SubtitleTrack::new(r"C:\subs\clip_en.srt", SubtitleStyle::default()).unwrap();
    let arg = track.filter_arg();
    assert!(arg.starts_with(r"subtitles='C\:/subs/clip_en.srt':charenc=UTF-8:force_style='"));
    assert!(arg.ends_with("MarginV=20'"));
}

#[test]
fn quoted_paths_are_rejected() {
    assert!(SubtitleTrack::new("it's.srt", SubtitleStyle::default()).is_err());
}

#[test]
fn sibling_subtitles_are_discovered() {
    let dir = std::env::temp_dir().join(format!("pipzoom_subs_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let video = dir.join("talk.mp4");
    assert_eq!(SubtitleTrack::find_sibling(&video, "_en"), None);
    std::fs::write(dir.join("talk_en.srt"), "1\n00:00:00,000 --> 00:00:01,000\nhi\n").unwrap();
    assert_eq!(
        SubtitleTrack::find_sibling(&video, "_en"),
        Some(dir.join("talk_en.srt"))
    );
    std::fs::remove_dir_all(&dir).unwrap();
}
