// Integration tests for loading season stat files from disk and assembling
// labelled examples from them.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;

use idp_core::catalog::StatCatalog;
use idp_core::dataset::LabelledExamples;
use idp_core::features::{build_labelled, build_unlabelled, FeatureLayout};
use idp_core::roster::WeekOneRoster;
use idp_core::season::{SeasonError, SeasonFiles, SeasonLoader, SeasonStats, Unit};

// ===========================================================================
// Fixtures
// ===========================================================================

const OFFENSE: &str = "\
player_id,player_display_name,position,season_type,recent_team,games,receptions,receiving_yards,receiving_tds,fantasy_points
00-0001,Ace Receiver,WR,REG,BUF,17,90,1100,8,200.0
00-0001,Ace Receiver,WR,POST,BUF,2,9,99,1,20.0
00-0002,Playoff Back,RB,POST,KC,3,4,20,0,3.0
00-0003,Traded End,TE,REG,NYJ,8,20,200,2,
00-0003,Traded End,TE,REG,MIA,9,15,150,1,31.5
";

const DEFENSE: &str = "\
player_id,player_display_name,position,season_type,team,def_games,def_sacks,def_tackles_solo,fantasy_points
00-0004,Edge Rusher,DE,REG,CHI,17,11,30,
00-0001,Ace Receiver,CB,REG,BUF,2,0,2,1.5
";

const KICKING: &str = "\
player_id,player_display_name,position,season_type,team,kck_games,fg_made,fg_made_distance,pat_made
00-0005,Big Leg,K,REG,BAL,17,30,1200,40
00-0005,Big Leg,K,POST,BAL,2,3,120,5
";

const ROSTER_HEADER: &str = "season,gsis_id,week,birth_date,entry_year,rookie_year,status,height,weight,years_exp,draft_number,full_name,first_name,last_name,team,position";

/// Per-test scratch directory under the system temp dir.
fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("idp-core-{name}-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write(dir: &Path, file: &str, contents: &str) -> PathBuf {
    let path = dir.join(file);
    fs::write(&path, contents).unwrap();
    path
}

fn season_files(dir: &Path) -> SeasonFiles {
    SeasonFiles {
        offense: write(dir, "offense.csv", OFFENSE),
        defense: write(dir, "defense.csv", DEFENSE),
        kicking: write(dir, "kicking.csv", KICKING),
    }
}

fn catalog() -> Arc<StatCatalog> {
    Arc::new(StatCatalog::standard())
}

// ===========================================================================
// Season loading
// ===========================================================================

#[test]
fn reg_filter_keeps_players_with_a_reg_row() {
    let dir = scratch("reg-filter");
    let files = season_files(&dir);
    let season = SeasonStats::load(catalog(), &files, "REG").unwrap();

    assert_eq!(
        season.player_ids().collect::<Vec<_>>(),
        vec!["00-0001", "00-0003", "00-0004", "00-0005"]
    );
    assert!(matches!(season.get("00-0002"), Err(SeasonError::NotFound(_))));

    let ace = season.get("00-0001").unwrap();
    assert!((ace.stat("receptions") - 90.0).abs() < 1e-12);
    // fantasy_points appears in both offense and defense files and sums.
    assert!((ace.stat("fantasy_points") - 201.5).abs() < 1e-12);

    let traded = season.get("00-0003").unwrap();
    assert_eq!(traded.games(Unit::Offense, "NYJ"), Some(8.0));
    assert_eq!(traded.games(Unit::Offense, "MIA"), Some(9.0));
    assert!((traded.position_weight("TE") - 17.0).abs() < 1e-12);
}

#[test]
fn post_filter_is_an_exact_string_match() {
    let dir = scratch("post-filter");
    let files = season_files(&dir);
    let post = SeasonStats::load(catalog(), &files, "POST").unwrap();
    assert_eq!(
        post.player_ids().collect::<Vec<_>>(),
        vec!["00-0001", "00-0002", "00-0005"]
    );
    let combined = SeasonStats::load(catalog(), &files, "REG+POST").unwrap();
    assert!(combined.is_empty());
}

#[test]
fn loading_twice_is_bit_identical() {
    let dir = scratch("idempotent");
    let files = season_files(&dir);
    let a = SeasonStats::load(catalog(), &files, "REG").unwrap();
    let b = SeasonStats::load(catalog(), &files, "REG").unwrap();
    assert_eq!(a.len(), b.len());
    for pid in a.player_ids() {
        let pa = a.get(pid).unwrap();
        let pb = b.get(pid).unwrap();
        let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&pa.features()), bits(&pb.features()));
        assert_eq!(pa.idp_score().to_bits(), pb.idp_score().to_bits());
        assert_eq!(pa.roles(), pb.roles());
    }
}

#[test]
fn unit_file_order_does_not_matter() {
    let dir = scratch("commutative");
    let files = season_files(&dir);
    let orders: [[&Path; 3]; 6] = [
        [&files.offense, &files.defense, &files.kicking],
        [&files.offense, &files.kicking, &files.defense],
        [&files.defense, &files.offense, &files.kicking],
        [&files.defense, &files.kicking, &files.offense],
        [&files.kicking, &files.offense, &files.defense],
        [&files.kicking, &files.defense, &files.offense],
    ];

    let load = |order: &[&Path; 3]| {
        let mut loader = SeasonLoader::new(catalog(), "REG");
        for path in order {
            loader.add_file(path).unwrap();
        }
        loader.finish()
    };

    let reference = load(&orders[0]);
    for order in &orders[1..] {
        let season = load(order);
        assert_eq!(
            season.player_ids().collect::<Vec<_>>(),
            reference.player_ids().collect::<Vec<_>>()
        );
        for player in reference.players() {
            let other = season.get(player.player_id()).unwrap();
            assert_eq!(other.stat_totals(), player.stat_totals());
            for unit in Unit::ALL {
                assert_eq!(other.games_by_team(unit), player.games_by_team(unit));
            }
        }
    }
}

#[test]
fn fractional_totals_are_bit_identical_in_any_unit_order() {
    let dir = scratch("fractional");
    let offense = write(
        &dir,
        "offense.csv",
        "player_id,player_display_name,position,season_type,recent_team,games,fantasy_points\n\
         00-0001,Two Way,WR,REG,BUF,1,0.1\n\
         00-0001,Two Way,WR,REG,MIA,1,0.1\n",
    );
    let defense = write(
        &dir,
        "defense.csv",
        "player_id,player_display_name,position,season_type,team,def_games,fantasy_points\n\
         00-0001,Two Way,CB,REG,MIA,1,0.4\n",
    );
    let kicking = write(&dir, "kicking.csv", KICKING);
    let orders: [[&Path; 3]; 6] = [
        [&offense, &defense, &kicking],
        [&offense, &kicking, &defense],
        [&defense, &offense, &kicking],
        [&defense, &kicking, &offense],
        [&kicking, &offense, &defense],
        [&kicking, &defense, &offense],
    ];

    let points = |order: &[&Path; 3]| {
        let mut loader = SeasonLoader::new(catalog(), "REG");
        for path in order {
            loader.add_file(path).unwrap();
        }
        let season = loader.finish();
        let player = season.get("00-0001").unwrap();
        let features: Vec<u64> = player.features().iter().map(|v| v.to_bits()).collect();
        (player.stat("fantasy_points").to_bits(), features)
    };

    let reference = points(&orders[0]);
    assert!((f64::from_bits(reference.0) - 0.6).abs() < 1e-12);
    for order in &orders[1..] {
        assert_eq!(points(order), reference);
    }
}

#[test]
fn bad_number_fails_the_whole_season() {
    let dir = scratch("bad-number");
    let files = SeasonFiles {
        offense: write(
            &dir,
            "offense.csv",
            "player_id,player_display_name,position,season_type,recent_team,games,receptions\n\
             00-0001,Ace,WR,REG,BUF,17,lots\n",
        ),
        defense: write(&dir, "defense.csv", DEFENSE),
        kicking: write(&dir, "kicking.csv", KICKING),
    };
    let err = SeasonStats::load(catalog(), &files, "REG").unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("00-0001"), "{msg}");
    assert!(msg.contains("receptions"), "{msg}");
}

#[test]
fn defense_file_without_team_is_fatal() {
    let dir = scratch("no-team");
    let files = SeasonFiles {
        offense: write(&dir, "offense.csv", OFFENSE),
        defense: write(
            &dir,
            "defense.csv",
            "player_id,player_display_name,position,season_type,def_games\n00-0004,Edge,DE,REG,17\n",
        ),
        kicking: write(&dir, "kicking.csv", KICKING),
    };
    let err = SeasonStats::load(catalog(), &files, "REG").unwrap_err();
    assert!(matches!(err, SeasonError::MissingTeam { .. }));
    assert!(err.to_string().contains("defense.csv"));
}

// ===========================================================================
// Feature assembly across two seasons
// ===========================================================================

#[test]
fn labelled_examples_have_fixed_width() {
    let dir = scratch("width");
    let files = season_files(&dir);
    let catalog = catalog();
    let prev = SeasonStats::load(Arc::clone(&catalog), &files, "REG").unwrap();
    let next = SeasonStats::load(Arc::clone(&catalog), &files, "REG").unwrap();

    let roster_csv = format!(
        "{ROSTER_HEADER}\n\
         2023,00-0001,1,1997-03-04,2019,2019,ACT,72,200,4,40,Ace Receiver,Ace,Receiver,BUF,WR\n\
         2023,00-0004,1,1995-07-08,2017,2017,ACT,76,260,6,3,Edge Rusher,Edge,Rusher,CHI,DE\n\
         2023,00-0004,2,1995-07-08,2017,2017,ACT,76,260,6,3,Edge Rusher,Edge,Rusher,CHI,DE\n\
         2023,00-0042,1,2001-01-01,2023,2023,ACT,70,190,0,,New Guy,New,Guy,DET,WR\n"
    );
    let roster_path = write(&dir, "roster.csv", &roster_csv);
    let as_of = NaiveDate::from_ymd_opt(2023, 9, 1).unwrap();
    let roster = WeekOneRoster::load(&roster_path, as_of).unwrap();
    assert_eq!(roster.len(), 3);

    let labelled = build_labelled(&roster, &prev, &roster, &next).unwrap();
    assert_eq!(labelled.player_ids(), ["00-0001", "00-0004"]);
    let expected_width = 16 + catalog.features().len() + 3 * 32 + 26;
    assert_eq!(labelled.width(), expected_width);
    assert_eq!(FeatureLayout::new(&catalog).width(), expected_width);

    let unlabelled = build_unlabelled(&roster, &prev, &roster).unwrap();
    assert_eq!(unlabelled.player_ids(), ["00-0001", "00-0004", "00-0042"]);
    assert_eq!(unlabelled.width(), expected_width);

    let merged = LabelledExamples::merge(&labelled, &labelled, 0.5).unwrap();
    assert_eq!(merged.len(), 4);
    assert_eq!(merged.weights()[2], 0.5 * labelled.weights()[0]);
    assert_eq!(merged.width(), expected_width);
}
