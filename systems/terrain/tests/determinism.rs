use prey_arena_core::{SectorCoord, Vec2};
use prey_arena_system_terrain::{NoiseParams, TerrainGenerator};

fn window(centre: SectorCoord) -> Vec<Vec<Vec2>> {
    let generator = TerrainGenerator::new(0xDEC0DE, 17.0, NoiseParams::default(), 5.0);
    centre
        .adjacent()
        .iter()
        .map(|sector| generator.generate(*sector))
        .collect()
}

#[test]
fn revisited_sectors_reproduce_their_layout() {
    let first = window(SectorCoord::new(4, -2));
    let second = window(SectorCoord::new(4, -2));

    assert_eq!(first, second);
}

#[test]
fn plain_layouts_vary_between_sectors() {
    let generator = TerrainGenerator::new(5, 17.0, NoiseParams::Plain { threshold: 0.0 }, 0.0);
    let shift = Vec2::new(17.0, 0.0);

    let west = generator.generate(SectorCoord::new(-1, 0));
    let east = generator.generate(SectorCoord::new(1, 0));
    let west_local: Vec<_> = west.iter().map(|position| *position + shift).collect();
    let east_local: Vec<_> = east.iter().map(|position| *position - shift).collect();

    assert!(!west.is_empty());
    assert_ne!(west_local, east_local);
}

#[test]
fn simplex_layouts_ignore_generation_order() {
    let params = NoiseParams::Simplex {
        threshold: 0.0,
        scale: 25.0,
        octaves: 1,
        persistence: 0.5,
        lacunarity: 2.0,
    };
    let generator = TerrainGenerator::new(17, 17.0, params, 0.0);
    let sectors = SectorCoord::new(2, 2).adjacent();

    let forward: Vec<_> = sectors.iter().map(|s| generator.generate(*s)).collect();
    let mut backward: Vec<_> = sectors.iter().rev().map(|s| generator.generate(*s)).collect();
    backward.reverse();

    assert_eq!(forward, backward);
    assert!(forward.iter().any(|obstacles| !obstacles.is_empty()));
}
